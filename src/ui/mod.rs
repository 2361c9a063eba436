mod views;

use crate::app::{App, Mode};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  views::connection::draw_connection_list(
    frame,
    chunks[0],
    app.items(),
    app.selected(),
    &app.title(),
    app.connection_state(),
    app.has_next(),
    app.pages_merged(),
  );

  draw_status_bar(frame, chunks[1], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.mode() {
    Mode::Normal => {
      if let Some(error) = app.error() {
        (format!(" error: {}", error), Style::default().fg(Color::Red))
      } else {
        let mut hint = " :command  j/k:nav  m:load more  r:refetch  q:quit".to_string();
        if let Some(at) = app.last_merged_at() {
          hint.push_str(&format!("  |  updated {}", at.format("%H:%M:%S")));
        }
        (hint, Style::default().fg(Color::DarkGray))
      }
    }
    Mode::Command => {
      let suggestions = app.autocomplete_suggestions();
      let mut line = format!(":{}", app.command_input());
      if !suggestions.is_empty() {
        let names: Vec<String> = suggestions
          .iter()
          .enumerate()
          .map(|(i, c)| {
            if i == app.selected_suggestion() {
              format!("[{}]", c.name)
            } else {
              c.name.to_string()
            }
          })
          .collect();
        line.push_str(&format!("  ({})", names.join(" | ")));
        if let Some(cmd) = suggestions.get(app.selected_suggestion()) {
          line.push_str(&format!("  {}", cmd.description));
        }
      }
      (line, Style::default().fg(Color::Yellow))
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

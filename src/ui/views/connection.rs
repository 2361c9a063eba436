use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::cache::Entity;
use crate::query::ConnectionState;

#[allow(clippy::too_many_arguments)]
pub fn draw_connection_list(
  frame: &mut Frame,
  area: Rect,
  items: &[Entity],
  selected: usize,
  title: &str,
  state: ConnectionState,
  has_next: bool,
  pages: u64,
) {
  let suffix = match state {
    ConnectionState::Uninitialized | ConnectionState::Loading => " (loading...)".to_string(),
    ConnectionState::FetchingMore => {
      format!(" ({} items, {} pages, fetching more...)", items.len(), pages)
    }
    ConnectionState::Ready => {
      let tail = if has_next { "more available" } else { "end" };
      format!(" ({} items, {} pages, {})", items.len(), pages, tail)
    }
  };

  let block = Block::default()
    .title(format!(" {}{} ", title, suffix))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if items.is_empty() {
    let content = match state {
      ConnectionState::Uninitialized | ConnectionState::Loading => "Loading ...",
      _ => "No results. :refetch to reload.",
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let list_items: Vec<ListItem> = items
    .iter()
    .map(|entity| {
      let mut spans = vec![
        Span::styled(
          format!("{:<24}", truncate(entity.id.as_str(), 24)),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
      ];

      if let Some(name) = entity.field("name") {
        spans.push(Span::raw(format!("{:<32}", truncate(name, 32))));
        spans.push(Span::raw(" "));
      }

      let rest: Vec<String> = entity
        .fields
        .iter()
        .filter(|(field, _)| field.as_str() != "name")
        .map(|(field, value)| format!("{}: {}", field, truncate(value, 40)))
        .collect();
      if !rest.is_empty() {
        spans.push(Span::styled(
          rest.join("  "),
          Style::default().fg(Color::DarkGray),
        ));
      }

      ListItem::new(Line::from(spans))
    })
    .collect();

  let list = List::new(list_items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut list_state = ListState::default();
  list_state.select(Some(selected));

  frame.render_stateful_widget(list, area, &mut list_state);
}

fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

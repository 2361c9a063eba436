use crate::cache::{CacheStore, Entity};
use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::{ConnectionQuery, ConnectionState};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Driver for the configured connection query
  query: ConnectionQuery,

  /// Shared cache behind the query
  store: Arc<CacheStore>,

  /// Snapshot of the accumulated list, refreshed after each merge
  items: Vec<Entity>,

  /// Selected row in the list
  selected: usize,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Application configuration
  config: Config,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let endpoint = config.endpoint()?;
    let client = crate::graphql::Client::new(endpoint, Config::get_api_token())?;

    let store = Arc::new(CacheStore::new());
    let query = ConnectionQuery::new(
      config.connection_spec(),
      Arc::clone(&store),
      config.fetch_more,
      config.query.explicit_document,
      move |request| {
        let client = client.clone();
        async move { client.fetch_page(&request).await }
      },
    );

    Ok(Self {
      query,
      store,
      items: Vec::new(),
      selected: 0,
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      config,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Initial data load
    self.query.fetch_first();

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event)?;
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        if self.query.poll() {
          self.refresh_items();
        }
      }
    }
    Ok(())
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        self.should_quit = true;
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),

      // Pagination
      KeyCode::Char('m') => self.query.fetch_more(),
      KeyCode::Char('r') => self.refetch(),

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }

      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        // Navigate autocomplete suggestions
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        // Navigate autocomplete suggestions backwards
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0; // Reset selection on input change
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Get the command to execute - either from selected suggestion or direct input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    match cmd.as_str() {
      "more" => self.query.fetch_more(),
      "refetch" => self.refetch(),
      "reset" => self.reset(),
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        // Unknown command
      }
    }
    self.command_input.clear();
  }

  /// Drop everything cached and fetch the first page again.
  fn refetch(&mut self) {
    self.reset();
    self.query.fetch_first();
  }

  /// Drop everything cached. An in-flight completion from before the
  /// reset will be discarded by the query's generation check.
  fn reset(&mut self) {
    info!(signature = %self.query.signature(), "cache reset");
    self.store.reset();
    self.query.on_reset();
    self.refresh_items();
  }

  fn refresh_items(&mut self) {
    self.items = self.query.items();
    if self.items.is_empty() {
      self.selected = 0;
    } else if self.selected >= self.items.len() {
      self.selected = self.items.len() - 1;
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.items.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  // Accessors for UI rendering
  pub fn items(&self) -> &[Entity] {
    &self.items
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn title(&self) -> String {
    format!(
      "{} · {}",
      self.config.display_title(),
      self.config.query.field
    )
  }

  pub fn connection_state(&self) -> ConnectionState {
    self.query.state()
  }

  pub fn has_next(&self) -> bool {
    self.query.has_next()
  }

  pub fn pages_merged(&self) -> u64 {
    self.query.pages_merged()
  }

  pub fn last_merged_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
    self.query.last_merged_at()
  }

  pub fn error(&self) -> Option<&str> {
    self.query.error()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}

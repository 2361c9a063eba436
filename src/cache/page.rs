//! One fetched page of a connection: ordered nodes plus continuation info.

use std::fmt;

use super::entity::Entity;

/// Opaque continuation token. Only the server assigns meaning to it; the
/// cache compares cursors for equality and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Cursor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A page as returned by the executor: entities in response order, the
/// cursor to continue from, and whether further pages exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPage {
  pub nodes: Vec<Entity>,
  pub end_cursor: Option<Cursor>,
  pub has_next: bool,
}

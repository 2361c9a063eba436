//! Normalized entities: an opaque identity plus named scalar fields.

use std::collections::BTreeMap;
use std::fmt;

/// Opaque, globally unique entity identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EntityId {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

impl From<String> for EntityId {
  fn from(id: String) -> Self {
    Self(id)
  }
}

/// A cached entity: identity plus scalar fields.
///
/// Fields merge last-write-wins per field name; a later fetch of the same
/// identity overwrites the fields it carries and leaves the rest alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
  pub id: EntityId,
  pub fields: BTreeMap<String, String>,
}

impl Entity {
  pub fn new(id: impl Into<EntityId>, fields: BTreeMap<String, String>) -> Self {
    Self {
      id: id.into(),
      fields,
    }
  }

  /// Merge `incoming` fields into this entity, last write wins per field.
  pub fn merge_fields(&mut self, incoming: &BTreeMap<String, String>) {
    for (name, value) in incoming {
      self.fields.insert(name.clone(), value.clone());
    }
  }

  pub fn field(&self, name: &str) -> Option<&str> {
    self.fields.get(name).map(String::as_str)
  }
}

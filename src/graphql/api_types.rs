//! Serde-deserializable types matching the GraphQL-over-HTTP wire format.
//!
//! These types are separate from the cache's domain types to allow clean
//! deserialization while keeping domain types focused on what the cache
//! needs. Only the relay connection shape is understood:
//! `edges { node { id ... } } pageInfo { endCursor hasNextPage }`.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::cache::{ConnectionPage, Cursor, Entity, EntityId};
use crate::error::FetchError;

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
  pub data: Option<serde_json::Map<String, serde_json::Value>>,
  #[serde(default)]
  pub errors: Vec<ApiGraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGraphQlError {
  pub message: String,
}

/// A relay connection as it appears under the queried field.
#[derive(Debug, Deserialize)]
pub struct ApiConnection {
  #[serde(default)]
  pub edges: Vec<ApiEdge>,
  #[serde(rename = "pageInfo")]
  pub page_info: ApiPageInfo,
}

#[derive(Debug, Deserialize)]
pub struct ApiEdge {
  pub node: ApiNode,
}

#[derive(Debug, Deserialize)]
pub struct ApiNode {
  pub id: String,
  // Catch-all for the selected scalar fields
  #[serde(flatten)]
  pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPageInfo {
  #[serde(rename = "endCursor")]
  pub end_cursor: Option<String>,
  #[serde(rename = "hasNextPage", default)]
  pub has_next_page: bool,
}

impl ApiEnvelope {
  /// Extract the connection under `field`, honoring the envelope's error
  /// semantics: any entry in `errors` fails the whole response.
  pub fn into_connection(self, field: &str) -> Result<ApiConnection, FetchError> {
    if !self.errors.is_empty() {
      let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
      return Err(FetchError::GraphQl(messages.join("; ")));
    }

    let mut data = self
      .data
      .ok_or_else(|| FetchError::MissingConnection(field.to_string()))?;
    let value = data
      .remove(field)
      .ok_or_else(|| FetchError::MissingConnection(field.to_string()))?;

    Ok(serde_json::from_value(value)?)
  }
}

impl ApiConnection {
  /// Convert into the cache's page representation.
  pub fn into_page(self) -> ConnectionPage {
    let nodes = self
      .edges
      .into_iter()
      .map(|edge| {
        let fields = edge
          .node
          .fields
          .iter()
          .filter_map(|(name, value)| scalar_string(value).map(|v| (name.clone(), v)))
          .collect();
        Entity::new(EntityId::from(edge.node.id), fields)
      })
      .collect();

    ConnectionPage {
      nodes,
      end_cursor: self.page_info.end_cursor.map(Cursor::new),
      has_next: self.page_info.has_next_page,
    }
  }
}

/// Coerce a scalar JSON value to its display string. Nested selections
/// are out of scope and dropped.
fn scalar_string(value: &serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::String(s) => Some(s.clone()),
    serde_json::Value::Number(n) => Some(n.to_string()),
    serde_json::Value::Bool(b) => Some(b.to_string()),
    serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
  }
}

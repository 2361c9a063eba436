//! Signature derivation for paginated queries.
//!
//! A signature identifies one paginated field in the cache: the query
//! name plus its non-cursor arguments, nothing else. Derivation is a pure
//! function of those inputs — the document text a request was built from
//! and the call site that issued it never participate, so two requests
//! for the same logical query always resolve to the same cache slot.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// The variable that carries the continuation cursor. Excluded from
/// signature derivation by construction.
pub const CURSOR_VARIABLE: &str = "after";

/// Cache identity of a paginated query, independent of pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureKey(String);

impl SignatureKey {
  /// Derive the signature for `query_name` with `variables`.
  ///
  /// Variables arrive in a `BTreeMap` so iteration order is canonical;
  /// values are serialized as JSON for a stable byte form. The cursor
  /// variable is skipped even if a caller left it in the map.
  pub fn derive(query_name: &str, variables: &BTreeMap<String, serde_json::Value>) -> Self {
    let mut input = format!("{}:", query_name.trim());
    for (name, value) in variables {
      if name == CURSOR_VARIABLE {
        continue;
      }
      input.push_str(name);
      input.push('=');
      input.push_str(&value.to_string());
      input.push(';');
    }

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    Self(hex::encode(hasher.finalize()))
  }
}

impl fmt::Display for SignatureKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn vars(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_cursor_variable_is_excluded() {
    let without = SignatureKey::derive("projects", &vars(&[("first", json!(1))]));
    let with = SignatureKey::derive(
      "projects",
      &vars(&[("first", json!(1)), ("after", json!("c1"))]),
    );

    assert_eq!(without, with);
  }

  #[test]
  fn test_same_inputs_same_key() {
    let a = SignatureKey::derive("projects", &vars(&[("first", json!(1))]));
    let b = SignatureKey::derive("projects", &vars(&[("first", json!(1))]));
    assert_eq!(a, b);
  }

  #[test]
  fn test_different_arguments_different_key() {
    let a = SignatureKey::derive("projects", &vars(&[("first", json!(1))]));
    let b = SignatureKey::derive("projects", &vars(&[("first", json!(2))]));
    assert_ne!(a, b);
  }

  #[test]
  fn test_different_query_name_different_key() {
    let a = SignatureKey::derive("projects", &vars(&[]));
    let b = SignatureKey::derive("groups", &vars(&[]));
    assert_ne!(a, b);
  }

  #[test]
  fn test_name_whitespace_is_normalized() {
    let a = SignatureKey::derive("projects", &vars(&[]));
    let b = SignatureKey::derive("  projects  ", &vars(&[]));
    assert_eq!(a, b);
  }
}

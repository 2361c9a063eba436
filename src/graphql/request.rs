//! Connection query description and page request construction.
//!
//! A [`ConnectionSpec`] describes the one paginated query this tool
//! drives: the connection field, page size, selected node fields, and any
//! extra arguments. [`PageRequest`] is a single page fetch built from the
//! spec. There are deliberately several ways to construct a request for
//! the same logical query, including one that supplies an explicit,
//! differently-formatted document; all of them resolve to the same cache
//! signature, because [`PageRequest::signature`] reads only the query
//! name and the non-cursor variables.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::cache::{Cursor, SignatureKey, CURSOR_VARIABLE};

/// The configured paginated query.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
  /// Connection field name, e.g. `projects`. Doubles as the logical
  /// query name for signature derivation.
  pub field: String,
  /// Page size passed as the `first` argument.
  pub page_size: u32,
  /// Scalar node fields to select besides `id`.
  pub node_fields: Vec<String>,
  /// Extra non-cursor arguments, rendered as literals in the document
  /// and included in the signature.
  pub arguments: BTreeMap<String, serde_json::Value>,
}

impl ConnectionSpec {
  /// Render the query document in the standard multi-line form.
  pub fn document(&self) -> String {
    let mut doc = String::new();
    let _ = writeln!(
      doc,
      "query {}($first: Int, ${}: String) {{",
      self.operation_name(),
      CURSOR_VARIABLE
    );
    let _ = writeln!(
      doc,
      "  {}(first: $first, {}: ${}{}) {{",
      self.field,
      CURSOR_VARIABLE,
      CURSOR_VARIABLE,
      self.rendered_arguments()
    );
    doc.push_str("    edges {\n      node {\n        id\n");
    for field in &self.node_fields {
      let _ = writeln!(doc, "        {}", field);
    }
    doc.push_str("      }\n    }\n");
    doc.push_str("    pageInfo {\n      endCursor\n      hasNextPage\n    }\n");
    doc.push_str("  }\n}\n");
    doc
  }

  /// Render the same document collapsed onto one line.
  ///
  /// Semantically identical to [`ConnectionSpec::document`] but a
  /// structurally different string, used to exercise the explicit-
  /// document request path.
  pub fn document_compact(&self) -> String {
    let mut doc = format!(
      "query {}($first: Int, ${c}: String) {{ {}(first: $first, {c}: ${c}{}) {{ edges {{ node {{ id",
      self.operation_name(),
      self.field,
      self.rendered_arguments(),
      c = CURSOR_VARIABLE
    );
    for field in &self.node_fields {
      let _ = write!(doc, " {}", field);
    }
    doc.push_str(" } } pageInfo { endCursor hasNextPage } } }");
    doc
  }

  /// Non-cursor variables for this query. The cursor is attached per
  /// request, never here.
  pub fn variables(&self) -> BTreeMap<String, serde_json::Value> {
    let mut vars = self.arguments.clone();
    vars.insert("first".to_string(), serde_json::json!(self.page_size));
    vars
  }

  /// Signature of this query's paginated field state.
  pub fn signature(&self) -> SignatureKey {
    SignatureKey::derive(&self.field, &self.variables())
  }

  fn operation_name(&self) -> String {
    let mut chars = self.field.chars();
    let capitalized: String = match chars.next() {
      Some(first) => first.to_uppercase().chain(chars).collect(),
      None => String::new(),
    };
    format!("{}Query", capitalized)
  }

  fn rendered_arguments(&self) -> String {
    let mut out = String::new();
    for (name, value) in &self.arguments {
      // JSON literals are valid GraphQL literals for the scalar values
      // the config accepts
      let _ = write!(out, ", {}: {}", name, value);
    }
    out
  }
}

/// One page fetch, however it was constructed.
#[derive(Debug, Clone)]
pub struct PageRequest {
  /// The document sent over the wire. Opaque to the cache.
  pub document: String,
  /// Logical query name (the connection field).
  pub query_name: String,
  /// Non-cursor variables.
  pub variables: BTreeMap<String, serde_json::Value>,
  /// Continuation cursor; `None` requests the first page.
  pub cursor: Option<Cursor>,
}

impl PageRequest {
  /// First page of the connection.
  pub fn first(spec: &ConnectionSpec) -> Self {
    Self {
      document: spec.document(),
      query_name: spec.field.clone(),
      variables: spec.variables(),
      cursor: None,
    }
  }

  /// Continuation page using the spec's own document.
  pub fn more(spec: &ConnectionSpec, cursor: Cursor) -> Self {
    Self {
      document: spec.document(),
      query_name: spec.field.clone(),
      variables: spec.variables(),
      cursor: Some(cursor),
    }
  }

  /// Continuation page with an explicitly supplied document instance.
  ///
  /// The document may be formatted differently from the spec's own; the
  /// cache signature does not look at it.
  pub fn more_with_document(document: impl Into<String>, spec: &ConnectionSpec, cursor: Cursor) -> Self {
    Self {
      document: document.into(),
      query_name: spec.field.clone(),
      variables: spec.variables(),
      cursor: Some(cursor),
    }
  }

  /// The paginated field state this request's pages merge into.
  pub fn signature(&self) -> SignatureKey {
    SignatureKey::derive(&self.query_name, &self.variables)
  }

  /// Wire body: `{"query": ..., "variables": ...}` with the cursor
  /// attached under its variable name.
  pub fn body(&self) -> serde_json::Value {
    let mut vars = self.variables.clone();
    if let Some(cursor) = &self.cursor {
      vars.insert(
        CURSOR_VARIABLE.to_string(),
        serde_json::json!(cursor.as_str()),
      );
    }
    serde_json::json!({
      "query": self.document,
      "variables": vars,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn spec() -> ConnectionSpec {
    ConnectionSpec {
      field: "projects".to_string(),
      page_size: 1,
      node_fields: vec!["name".to_string()],
      arguments: BTreeMap::new(),
    }
  }

  #[test]
  fn test_explicit_document_resolves_same_signature() {
    // The original defect: a fetch-more carrying an explicit document
    // merged into a different cache entry than one relying on the
    // original query. Both constructions must resolve identically.
    let spec = spec();
    let default_path = PageRequest::more(&spec, Cursor::new("c1"));
    let explicit_path =
      PageRequest::more_with_document(spec.document_compact(), &spec, Cursor::new("c1"));

    assert_ne!(default_path.document, explicit_path.document);
    assert_eq!(default_path.signature(), explicit_path.signature());
    assert_eq!(default_path.signature(), spec.signature());
  }

  #[test]
  fn test_first_and_more_share_signature() {
    let spec = spec();
    let first = PageRequest::first(&spec);
    let more = PageRequest::more(&spec, Cursor::new("c1"));
    assert_eq!(first.signature(), more.signature());
  }

  #[test]
  fn test_cursor_lands_in_body_variables_only() {
    let spec = spec();
    let request = PageRequest::more(&spec, Cursor::new("c1"));

    let body = request.body();
    assert_eq!(body["variables"]["after"], json!("c1"));
    assert_eq!(body["variables"]["first"], json!(1));
    // The request's own variable map never holds the cursor
    assert!(!request.variables.contains_key("after"));
  }

  #[test]
  fn test_first_page_body_has_no_cursor() {
    let body = PageRequest::first(&spec()).body();
    assert!(body["variables"].get("after").is_none());
  }

  #[test]
  fn test_document_selects_configured_fields() {
    let doc = spec().document();
    assert!(doc.contains("query ProjectsQuery($first: Int, $after: String)"));
    assert!(doc.contains("projects(first: $first, after: $after)"));
    assert!(doc.contains("name"));
    assert!(doc.contains("endCursor"));
    assert!(doc.contains("hasNextPage"));
  }

  #[test]
  fn test_extra_arguments_render_and_distinguish() {
    let mut with_args = spec();
    with_args
      .arguments
      .insert("membership".to_string(), json!(true));

    assert!(with_args
      .document()
      .contains("projects(first: $first, after: $after, membership: true)"));
    assert_ne!(with_args.signature(), spec().signature());
  }
}

//! Error taxonomy for the fetch path.
//!
//! Everything that can go wrong between issuing a page request and having
//! a decoded page in hand is a `FetchError`. Fetch failures never mutate
//! cached state; the view renders them and the last merged list stays
//! as-is. Signature ambiguity has no variant here on purpose: signatures
//! are derived from query name and non-cursor arguments only, so two
//! requests for the same logical query cannot land in different slots.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
  /// Transport-level failure (connect, TLS, timeout, body read).
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// Endpoint answered with a non-success status.
  #[error("endpoint returned HTTP {status}: {body}")]
  Status { status: u16, body: String },

  /// The response envelope carried GraphQL errors instead of data.
  #[error("GraphQL error: {0}")]
  GraphQl(String),

  /// Envelope decoded, but the configured connection field was absent.
  #[error("response has no `{0}` connection field")]
  MissingConnection(String),

  /// Response body was not a valid GraphQL envelope.
  #[error("failed to decode response: {0}")]
  Decode(#[from] serde_json::Error),
}

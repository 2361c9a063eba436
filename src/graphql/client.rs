//! GraphQL-over-HTTP page executor.

use tracing::debug;
use url::Url;

use crate::cache::ConnectionPage;
use crate::error::FetchError;

use super::api_types::ApiEnvelope;
use super::request::PageRequest;

/// Thin client that executes one page request at a time.
#[derive(Clone)]
pub struct Client {
  http: reqwest::Client,
  endpoint: Url,
  token: Option<String>,
}

impl Client {
  pub fn new(endpoint: Url, token: Option<String>) -> Result<Self, FetchError> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("gqb/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      endpoint,
      token,
    })
  }

  /// Execute one page fetch and decode the connection it returns.
  pub async fn fetch_page(&self, request: &PageRequest) -> Result<ConnectionPage, FetchError> {
    debug!(
      query = %request.query_name,
      cursor = request.cursor.as_ref().map(|c| c.as_str()),
      "fetching page"
    );

    let mut builder = self.http.post(self.endpoint.clone()).json(&request.body());
    if let Some(token) = &self.token {
      builder = builder.bearer_auth(token);
    }

    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(FetchError::Status {
        status: status.as_u16(),
        body: truncate(&body, 200),
      });
    }

    let envelope: ApiEnvelope = response.json().await?;
    let page = envelope
      .into_connection(&request.query_name)?
      .into_page();

    debug!(
      nodes = page.nodes.len(),
      has_next = page.has_next,
      "page fetched"
    );
    Ok(page)
  }
}

fn truncate(s: &str, max_len: usize) -> String {
  if s.len() <= max_len {
    s.to_string()
  } else {
    let cut = s
      .char_indices()
      .take_while(|(i, _)| *i <= max_len)
      .last()
      .map(|(i, _)| i)
      .unwrap_or(0);
    format!("{}...", &s[..cut])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_keeps_short_bodies() {
    assert_eq!(truncate("short", 200), "short");
  }

  #[test]
  fn test_truncate_cuts_on_char_boundary() {
    let s = "ééééé";
    let cut = truncate(s, 4);
    assert!(cut.ends_with("..."));
    assert!(cut.len() < s.len() + 3);
  }
}

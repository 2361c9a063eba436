use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::graphql::ConnectionSpec;
use crate::query::FetchMorePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  pub query: QueryConfig,
  /// Custom title for the list header (defaults to the endpoint host)
  pub title: Option<String>,
  /// What to do when "load more" fires while a fetch is in flight
  #[serde(default)]
  pub fetch_more: FetchMorePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// GraphQL endpoint URL, e.g. https://gitlab.com/api/graphql
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
  /// Connection field to paginate, e.g. "projects"
  pub field: String,
  /// Page size requested per fetch
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  /// Scalar node fields to select besides id
  #[serde(default = "default_node_fields")]
  pub node_fields: Vec<String>,
  /// Extra non-cursor arguments for the connection field
  #[serde(default)]
  pub arguments: BTreeMap<String, serde_json::Value>,
  /// Send fetch-more requests with an explicitly constructed document
  /// instead of reusing the original. Cache behavior is identical either
  /// way; the toggle exists to demonstrate that.
  #[serde(default)]
  pub explicit_document: bool,
}

fn default_page_size() -> u32 {
  20
}

fn default_node_fields() -> Vec<String> {
  vec!["name".to_string()]
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gqb.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gqb/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/gqb/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("gqb.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gqb").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Parsed and validated endpoint URL.
  pub fn endpoint(&self) -> Result<Url> {
    Url::parse(&self.api.url)
      .map_err(|e| eyre!("Invalid endpoint URL '{}': {}", self.api.url, e))
  }

  /// Title for the header: configured, or the endpoint host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .endpoint()
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.api.url.clone())
  }

  /// The connection spec this config describes.
  pub fn connection_spec(&self) -> ConnectionSpec {
    ConnectionSpec {
      field: self.query.field.clone(),
      page_size: self.query.page_size,
      node_fields: self.query.node_fields.clone(),
      arguments: self.query.arguments.clone(),
    }
  }

  /// Optional bearer token from the environment.
  ///
  /// Checks GQB_API_TOKEN; the config file never holds credentials.
  pub fn get_api_token() -> Option<String> {
    std::env::var("GQB_API_TOKEN").ok().filter(|t| !t.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = "
api:
  url: https://gitlab.com/api/graphql
query:
  field: projects
";

  #[test]
  fn test_minimal_config_defaults() {
    let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
    assert_eq!(config.query.page_size, 20);
    assert_eq!(config.query.node_fields, vec!["name"]);
    assert_eq!(config.fetch_more, FetchMorePolicy::Ignore);
    assert!(!config.query.explicit_document);
    assert!(config.query.arguments.is_empty());
  }

  #[test]
  fn test_full_config_parses() {
    let raw = "
api:
  url: https://gitlab.com/api/graphql
query:
  field: projects
  page_size: 5
  node_fields: [name, description]
  arguments:
    membership: true
  explicit_document: true
title: GitLab projects
fetch_more: queue
";
    let config: Config = serde_yaml::from_str(raw).unwrap();
    assert_eq!(config.query.page_size, 5);
    assert_eq!(config.fetch_more, FetchMorePolicy::Queue);
    assert!(config.query.explicit_document);
    assert_eq!(config.display_title(), "GitLab projects");
    assert_eq!(
      config.query.arguments.get("membership"),
      Some(&serde_json::json!(true))
    );
  }

  #[test]
  fn test_display_title_falls_back_to_host() {
    let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
    assert_eq!(config.display_title(), "gitlab.com");
  }

  #[test]
  fn test_invalid_endpoint_is_rejected() {
    let raw = "
api:
  url: not a url
query:
  field: projects
";
    let config: Config = serde_yaml::from_str(raw).unwrap();
    assert!(config.endpoint().is_err());
  }
}

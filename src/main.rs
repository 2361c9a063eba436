mod app;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod graphql;
mod query;
mod ui;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gqb")]
#[command(about = "A terminal browser for relay-style paginated GraphQL connections")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gqb/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// GraphQL endpoint URL (overrides the config file)
  #[arg(short, long)]
  endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override endpoint if specified on command line
  let config = if let Some(endpoint) = args.endpoint {
    config::Config {
      api: config::ApiConfig { url: endpoint },
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}

/// Route logs to a file; the terminal belongs to the TUI.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("gqb");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(log_dir, "gqb.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

//! Mock Apollo config service.
//!
//! Serves configuration snapshots from local files over the Apollo config
//! HTTP API and notifies long-polling clients when a file changes.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     MOCK APOLLO                       │
//!                      │                                                       │
//!   snapshot files ────┼─▶┌──────────┐ change  ┌─────────────┐                  │
//!   (YAML/JSON/TOML)   │  │ snapshot │────────▶│ coordinator │                  │
//!                      │  │ watchers │ signal  │  (registry) │                  │
//!                      │  └────┬─────┘         └──────┬──────┘                  │
//!                      │       │ current              │ resolve()               │
//!                      │       ▼                      ▼                         │
//!   Client ────────────┼─▶┌──────────┐  lookup / ┌──────────┐                   │
//!   (config, poll)     │  │   http   │──────────▶│   poll   │                   │
//!          ◀───────────┼──│  server  │  long poll│ requests │                   │
//!                      │  └──────────┘           └──────────┘                   │
//!                      │                                                       │
//!   Operator ──────────┼─▶ admin (log level, status, reload)                    │
//!                      │                                                       │
//!                      │  config · observability · lifecycle                   │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use mock_apollo::config::{self, ServerConfig};
use mock_apollo::lifecycle::{self, wait_for_shutdown};
use mock_apollo::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "mock-apollo", version, about = "Mock Apollo config service", long_about = None)]
struct Args {
    /// Server settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot file to serve; repeat for several files, first match wins
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Public config listener port
    #[arg(long)]
    config_port: Option<u16>,

    /// Internal admin listener port
    #[arg(long)]
    internal_port: Option<u16>,

    /// Long poll timeout in seconds
    #[arg(long)]
    poll_timeout_secs: Option<u64>,

    /// Log level (debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if !self.files.is_empty() {
            config.watch.paths = self.files;
        }
        if let Some(port) = self.config_port {
            config.listener.bind_address = format!("0.0.0.0:{port}");
        }
        if let Some(port) = self.internal_port {
            config.admin.bind_address = format!("0.0.0.0:{port}");
        }
        if let Some(secs) = self.poll_timeout_secs {
            config.poll.timeout_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = Args::parse();

    let mut server_config = match args.config.take() {
        Some(path) => config::load_config(&path)?,
        None => ServerConfig::default(),
    };
    args.apply(&mut server_config);
    config::loader::validate(&server_config)?;

    let log_level = logging::init(&server_config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mock-apollo starting");

    let app = lifecycle::start(server_config, log_level).await?;

    tokio::select! {
        () = wait_for_shutdown() => app.shutdown(),
        // A server failure triggers shutdown on its own.
        () = app.shutdown_triggered() => {}
    }

    app.wait().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

//! Configuration schema definitions.
//!
//! This module defines the server settings. These are distinct from the
//! configuration snapshots the service hands out to clients. All types derive
//! Serde traits for deserialization from a TOML file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snapshot::{ValidationOptions, WatchOptions};

/// Root configuration for the mock config service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Public listener (config queries and long polls).
    pub listener: ListenerConfig,

    /// Internal listener (log level switch, status, reload).
    pub admin: AdminConfig,

    /// Long-poll settings.
    pub poll: PollConfig,

    /// Snapshot files and how they are watched.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8070").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8070".to_string(),
        }
    }
}

/// Internal admin listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin routes.
    pub enabled: bool,

    /// Admin bind address.
    pub bind_address: String,

    /// Bearer token required on admin routes, if set.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:9090".to_string(),
            api_key: None,
        }
    }
}

/// Long-poll configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// How long a poll waits for a change before answering 304.
    pub timeout_secs: u64,
}

impl PollConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Snapshot watch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Snapshot files, queried in this order.
    pub paths: Vec<PathBuf>,

    /// File polling interval in milliseconds (minimum 1000).
    pub interval_ms: u64,

    /// Reject namespaces without a `releaseKey`.
    pub require_release_key: bool,
}

impl WatchConfig {
    pub fn options(&self) -> WatchOptions {
        WatchOptions {
            interval: Duration::from_millis(self.interval_ms),
            validation: ValidationOptions {
                require_release_key: self.require_release_key,
            },
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            interval_ms: 1000,
            require_release_key: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}

//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (pretty or JSON output)
//! - Hand out the single [`LogLevelHandle`] used to change the level at runtime
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level at startup
//! - The level filter sits behind a `reload` layer; replacing the level swaps
//!   the filter in place instead of touching global state directly

use std::fmt;
use std::str::FromStr;

use tracing::Subscriber;
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, reload, EnvFilter, Registry};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Log levels accepted by the runtime level switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LogLevelError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogLevelError {
    #[error("unknown log level '{0}'")]
    Unknown(String),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("log level could not be replaced: {0}")]
    Reload(#[from] reload::Error),

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Owned handle to the process log level.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelHandle {
    /// Replace the active filter with `level` for this service's targets.
    pub fn replace(&self, level: LogLevel) -> Result<(), LogLevelError> {
        self.inner.reload(EnvFilter::try_new(default_directives(level.as_str()))?)?;
        tracing::info!(level = %level, "Log level replaced");
        Ok(())
    }

    /// Current filter directives, rendered as text.
    pub fn current(&self) -> Option<String> {
        self.inner.with_current(|filter| filter.to_string()).ok()
    }
}

impl fmt::Debug for LogLevelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogLevelHandle").field("current", &self.current()).finish()
    }
}

/// Build the subscriber without installing it.
///
/// The handle stays usable for as long as the returned subscriber is alive.
pub fn build(
    config: &ObservabilityConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogLevelHandle), LogLevelError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(&config.log_level))?,
    };
    let (filter, handle) = reload::Layer::new(filter);

    let json = config.log_format == LogFormat::Json;
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_fmt::layer().json()))
        .with((!json).then(|| tracing_fmt::layer()));

    Ok((subscriber, LogLevelHandle { inner: handle }))
}

/// Build the subscriber and install it as the global default.
pub fn init(config: &ObservabilityConfig) -> Result<LogLevelHandle, LogLevelError> {
    let (subscriber, handle) = build(config)?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(handle)
}

fn default_directives(level: &str) -> String {
    format!("mock_apollo={level},tower_http={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!(matches!("trace".parse::<LogLevel>(), Err(LogLevelError::Unknown(_))));
        assert!("INFO".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_replace_level() {
        let (_subscriber, handle) = build(&ObservabilityConfig::default()).unwrap();
        handle.replace(LogLevel::Warn).unwrap();
        assert!(handle.current().unwrap().contains("mock_apollo=warn"));
    }

    #[test]
    fn test_replace_after_subscriber_dropped() {
        let (subscriber, handle) = build(&ObservabilityConfig::default()).unwrap();
        drop(subscriber);
        assert!(matches!(handle.replace(LogLevel::Debug), Err(LogLevelError::Reload(_))));
    }
}

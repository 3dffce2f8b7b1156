//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, runtime level switch)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted strings
//! - Request ID flows through the HTTP trace spans
//! - The log level is owned by one handle, replaced through the admin API

pub mod logging;
pub mod metrics;

pub use logging::{LogLevel, LogLevelError, LogLevelHandle};

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `apollo_snapshot_reloads_total` (counter): reload attempts by result
//! - `apollo_polls_outstanding` (gauge): polls currently registered
//! - `apollo_poll_outcomes_total` (counter): finished polls by outcome
//! - `apollo_config_requests_total` (counter): config queries by route, status
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_snapshot_reload(success: bool) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!("apollo_snapshot_reloads_total", "result" => result).increment(1);
}

pub fn set_outstanding_polls(count: usize) {
    metrics::gauge!("apollo_polls_outstanding").set(count as f64);
}

pub fn record_poll_outcome(outcome: &'static str) {
    metrics::counter!("apollo_poll_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_config_request(route: &'static str, status: u16) {
    metrics::counter!(
        "apollo_config_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

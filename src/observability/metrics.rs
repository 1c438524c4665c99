//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sentinel_snapshots_total` (counter): snapshots received, by source
//! - `sentinel_errors_total` (counter): non-fatal source errors, by source
//! - `engine_reloads_total` (counter): reloads, by outcome
//! - `engine_reload_duration_seconds` (histogram): shutdown + rebind time
//! - `engine_control_points` (gauge): control points in the applied model

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_snapshot(source: &str) {
    ::metrics::counter!("sentinel_snapshots_total", "source" => source.to_string()).increment(1);
}

pub fn record_sentinel_error(source: &str) {
    ::metrics::counter!("sentinel_errors_total", "source" => source.to_string()).increment(1);
}

pub fn record_reload(outcome: &'static str, started: Instant) {
    ::metrics::counter!("engine_reloads_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("engine_reload_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn set_control_points(count: usize) {
    ::metrics::gauge!("engine_control_points").set(count as f64);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_outcomes_total` (counter): terminal gate outcomes by `outcome`
//! - `gatekeeper_identity_cache_total` (counter): identity cache lookups by `result`
//! - `gatekeeper_rate_limited_total` (counter): requests denied by rate admission
//! - `gatekeeper_rate_limit_keys` (gauge): client keys tracked by the limiter
//!
//! Without an installed recorder every call here is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("gatekeeper_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_identity_cache(result: &'static str) {
    metrics::counter!("gatekeeper_identity_cache_total", "result" => result).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("gatekeeper_rate_limited_total").increment(1);
}

pub fn record_rate_limit_keys(count: usize) {
    metrics::gauge!("gatekeeper_rate_limit_keys").set(count as f64);
}

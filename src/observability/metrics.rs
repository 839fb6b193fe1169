//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_decisions_total` (counter): decisions by tier
//! - `gateway_cache_events_total` (counter): cache hits, misses, evictions
//! - `gateway_cache_entries` (gauge): current cache size
//! - `gateway_resolution_duration_seconds` (histogram): pipeline latency
//! - `gateway_security_alerts_total` (counter): restricted denials by severity
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   and tests pay nothing
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(tier: &'static str, started: Instant) {
    metrics::counter!("gateway_decisions_total", "tier" => tier).increment(1);
    metrics::histogram!("gateway_resolution_duration_seconds", "tier" => tier)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_cache_event(event: &'static str, count: u64) {
    if count > 0 {
        metrics::counter!("gateway_cache_events_total", "event" => event).increment(count);
    }
}

pub fn record_cache_size(size: usize) {
    metrics::gauge!("gateway_cache_entries").set(size as f64);
}

pub fn record_security_alert(severity: &'static str) {
    metrics::counter!("gateway_security_alerts_total", "severity" => severity).increment(1);
}

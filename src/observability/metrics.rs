//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by method, status
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_access_denied_total` (counter): rejections by error code
//! - `gate_rate_limited_total` (counter): denials by rule
//! - `gate_rate_limit_entries` (gauge): tracked windows after a sweep
//! - `gate_points_awarded_total` (counter): renewal points credited

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("gate_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    metrics::histogram!("gate_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_access_denied(code: &'static str) {
    metrics::counter!("gate_access_denied_total", "code" => code).increment(1);
}

pub fn record_rate_limited(rule: &'static str) {
    metrics::counter!("gate_rate_limited_total", "rule" => rule).increment(1);
}

pub fn record_rate_limit_entries(count: usize) {
    metrics::gauge!("gate_rate_limit_entries").set(count as f64);
}

pub fn record_points_awarded(points: u64) {
    metrics::counter!("gate_points_awarded_total").increment(points);
}

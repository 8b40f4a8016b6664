//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): forwarded requests by method, status, backend
//! - `lb_request_duration_seconds` (histogram): end-to-end latency
//! - `lb_backend_health` (gauge): 1=alive, 0=dead, per backend
//! - `lb_retries_total` (counter): transport-failure retries by backend

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one forwarded request.
pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    metrics::counter!(
        "lb_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "lb_request_duration_seconds",
        "method" => method.to_string(),
        "backend" => backend.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a retry caused by a transport failure.
pub fn record_retry(backend: &str) {
    metrics::counter!("lb_retries_total", "backend" => backend.to_string()).increment(1);
}

/// Record a backend's current liveness belief.
pub fn record_backend_health(backend: &str, alive: bool) {
    let value = if alive { 1.0 } else { 0.0 };
    metrics::gauge!("lb_backend_health", "backend" => backend.to_string()).set(value);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `user_service_requests_total` (counter): handler invocations by method, handler, status
//! - `user_service_request_duration_seconds` (histogram): handler latency
//! - `user_service_operations_total` (counter): service operations by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

/// Record a finished handler invocation.
pub fn record_request(method: &str, handler: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "user_service_requests_total",
        "method" => method.to_string(),
        "handler" => handler,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "user_service_request_duration_seconds",
        "method" => method.to_string(),
        "handler" => handler
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a finished service operation.
pub fn record_operation(operation: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "user_service_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): completed requests by method, status
//! - `http_request_duration_seconds` (histogram): time until the response was ended
//! - `http_requests_in_flight` (gauge): dispatches currently running
//! - `http_dispatch_failures_total` (counter): failures that escaped the error funnel
//!
//! # Design Decisions
//! - Recording is always on and cheap; without an installed recorder the
//!   `metrics` macros are no-ops
//! - Exposition is optional (Prometheus scrape endpoint)

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &Method, status: u16, start: Instant) {
    let method = method_label(method);
    let status = status.to_string();
    metrics::counter!("http_requests_total", "method" => method, "status" => status.clone())
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Label for a request method. Extension methods share one label so clients
/// cannot grow the label set.
fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}

/// Publish the number of dispatches currently running.
pub fn set_in_flight(count: u64) {
    metrics::gauge!("http_requests_in_flight").set(count as f64);
}

/// Count a failure that reached the serving boundary.
pub fn record_dispatch_failure() {
    metrics::counter!("http_dispatch_failures_total").increment(1);
}

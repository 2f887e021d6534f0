//! Metrics collection and exposition.
//!
//! # Metrics
//! - `greeter_http_requests_total` (counter): requests by method, status
//! - `greeter_http_request_duration_seconds` (histogram): latency distribution
//! - `greeter_active_connections` (gauge): open client connections
//! - `greeter_cache_probe_total` (counter): probe outcomes by result
//!
//! Recording is a no-op until a recorder is installed, so tests and runs
//! with the exporter disabled pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "greeter_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("greeter_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one cache probe outcome.
pub fn record_cache_probe(reachable: bool) {
    let result = if reachable { "reachable" } else { "unreachable" };
    counter!("greeter_cache_probe_total", "result" => result).increment(1);
}

/// Publish the number of open client connections.
pub fn set_active_connections(count: u64) {
    gauge!("greeter_active_connections").set(count as f64);
}

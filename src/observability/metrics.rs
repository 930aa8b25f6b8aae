//! Metrics collection and exposition.
//!
//! # Metrics
//! - `backend_proxy_requests_total` (counter): handler invocations by route, method, status
//! - `backend_proxy_request_duration_seconds` (histogram): handler latency by route, method
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus exporter is optional and serves its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "backend_proxy_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "backend_proxy_request_duration_seconds";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed handler invocation.
pub fn record_request(route: &str, method: &str, status: u16, start_time: Instant) {
    let elapsed = start_time.elapsed().as_secs_f64();

    ::metrics::counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(elapsed);
}

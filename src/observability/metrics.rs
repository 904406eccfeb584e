//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devserver_proxy_requests_total` (counter): proxied requests by status
//! - `devserver_proxy_duration_seconds` (histogram): upstream latency
//! - `devserver_module_loads_total` (counter): module loads by route and outcome
//! - `devserver_config_reloads_total` (counter): accepted config reloads

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_proxy_request(status: u16, start: Instant) {
    metrics::counter!("devserver_proxy_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("devserver_proxy_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_module_load(route: &str, outcome: &'static str) {
    metrics::counter!(
        "devserver_module_loads_total",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

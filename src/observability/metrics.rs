//! Metrics collection and exposition.
//!
//! # Metrics
//! - `crconfig_requests_total` (counter): publish requests by mode, status
//! - `crconfig_request_duration_seconds` (histogram): time to build a response
//! - `crconfig_cdn_failures_total` (counter): per-CDN omissions by stage (fetch, parse)
//! - `crconfig_envelope_cdns` (gauge): entries in the last multi-CDN envelope
//!
//! Recording without an installed exporter is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_publish(mode: &'static str, status: u16, start_time: Instant) {
    counter!("crconfig_requests_total", "mode" => mode, "status" => status.to_string()).increment(1);
    histogram!("crconfig_request_duration_seconds", "mode" => mode)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_cdn_failure(cdn: &str, stage: &'static str) {
    counter!("crconfig_cdn_failures_total", "cdn" => cdn.to_string(), "stage" => stage).increment(1);
}

pub fn record_envelope_size(entries: usize) {
    gauge!("crconfig_envelope_cdns").set(entries as f64);
}

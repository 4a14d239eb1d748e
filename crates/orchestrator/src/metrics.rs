//! Process-wide request/latency/cache counters (§5's "Ambient supplement").
//!
//! Grounded on the donor server crate's `init_metrics`/`record_request`/
//! `record_total_latency`/`record_error` free-function idiom, generalized
//! from STT/LLM/TTS stage latencies to node/request latencies and cache
//! hit rate for the query pipeline.

use std::time::Duration;

/// Installs the process-wide Prometheus recorder. Call once at startup;
/// safe to call more than once in tests (subsequent installs are ignored).
pub fn init_metrics() {
    let _ = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder();
}

pub fn record_request(channel: &str) {
    metrics::counter!("gweta_requests_total", "channel" => channel.to_string()).increment(1);
}

pub fn record_request_error(kind: &str) {
    metrics::counter!("gweta_request_errors_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_total_latency(elapsed: Duration, source: &str) {
    metrics::histogram!("gweta_request_latency_ms", "source" => source.to_string()).record(elapsed.as_millis() as f64);
}

pub fn record_cache_outcome(hit: bool) {
    metrics::counter!("gweta_cache_lookups_total", "hit" => hit.to_string()).increment(1);
}

//! Prometheus metrics for ghost-service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Upstream provider metrics
pub static UPSTREAM_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UPSTREAM_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    let upstream_requests = IntCounterVec::new(
        Opts::new(
            "ghost_upstream_requests_total",
            "Upstream generation calls by terminal outcome",
        ),
        &["provider", "outcome"],
    )
    .expect("Failed to create ghost_upstream_requests_total metric");

    let upstream_latency = HistogramVec::new(
        HistogramOpts::new(
            "ghost_upstream_latency_seconds",
            "Upstream generation latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0]),
        &["provider", "model"],
    )
    .expect("Failed to create ghost_upstream_latency_seconds metric");

    registry
        .register(Box::new(http_requests.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(upstream_requests.clone()))
        .expect("Failed to register ghost_upstream_requests_total");
    registry
        .register(Box::new(upstream_latency.clone()))
        .expect("Failed to register ghost_upstream_latency_seconds");

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_duration);
    let _ = UPSTREAM_REQUESTS_TOTAL.set(upstream_requests);
    let _ = UPSTREAM_LATENCY_SECONDS.set(upstream_latency);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => return "# Metrics registry not initialized\n".to_string(),
    };

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        let status = status.to_string();
        counter
            .with_label_values(&[method, path, status.as_str()])
            .inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

pub fn record_upstream_call(provider: &str, model: &str, outcome: &str, duration_secs: f64) {
    if let Some(counter) = UPSTREAM_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[provider, outcome]).inc();
    }
    if let Some(histogram) = UPSTREAM_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_calls_show_up_in_exposition() {
        init_metrics();
        init_metrics();
        record_upstream_call("mock", "mock-model", "succeeded", 0.2);

        let text = get_metrics();
        assert!(text.contains("ghost_upstream_requests_total"));
        assert!(text.contains(r#"outcome="succeeded""#));
    }
}

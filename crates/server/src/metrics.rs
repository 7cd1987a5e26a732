//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here. Sync metrics are defined in
//! `mirror_core::metrics` and registered alongside them, and the mirror
//! gauges are refreshed from the store on every scrape.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mirror_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirror_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirror_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Mirror Metrics (collected dynamically)
// =============================================================================

/// Sync running state (1 = a cycle is in progress).
pub static SYNC_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirror_sync_running",
        "Whether a sync cycle is running (1) or not (0)",
    )
    .unwrap()
});

/// Series rows in the local mirror.
pub static SERIES_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mirror_series_stored", "Number of series in the local mirror").unwrap()
});

/// Series flagged for a downstream refresh.
pub static SERIES_NEEDING_UPDATE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirror_series_needing_update",
        "Number of series flagged for a downstream refresh",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Mirror
    registry.register(Box::new(SYNC_RUNNING.clone())).unwrap();
    registry.register(Box::new(SERIES_STORED.clone())).unwrap();
    registry
        .register(Box::new(SERIES_NEEDING_UPDATE.clone()))
        .unwrap();

    // Core metrics (sync cycles, remote requests)
    for metric in mirror_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the store at scrape time.
pub async fn collect_dynamic_metrics(state: &AppState) {
    SYNC_RUNNING.set(if state.sync().is_running().await { 1 } else { 0 });

    if let Ok(stats) = state.store().stats() {
        SERIES_STORED.set(stats.series as i64);
        SERIES_NEEDING_UPDATE.set(stats.needing_update as i64);
    }
}

//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sync cycles (outcomes, duration)
//! - Catalog items (per-item outcome, flagged rows)
//! - Remote traffic (pages, requests, retries, latency)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sync cycles
// =============================================================================

/// Sync cycles total by outcome.
pub static SYNC_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirror_sync_cycles_total", "Total sync cycles"),
        &["outcome"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Sync cycle duration in seconds.
pub static SYNC_CYCLE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mirror_sync_cycle_duration_seconds",
            "Wall time of a sync cycle",
        )
        .buckets(vec![1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0]),
    )
    .unwrap()
});

// =============================================================================
// Items
// =============================================================================

/// Catalog items processed by outcome.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirror_items_processed_total", "Catalog items processed"),
        &["outcome"], // "created", "updated", "unchanged", "skipped"
    )
    .unwrap()
});

/// Items written with the needs-update flag set.
pub static ITEMS_FLAGGED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mirror_items_flagged_total",
        "Items upserted with the needs-update flag set",
    )
    .unwrap()
});

// =============================================================================
// Remote traffic
// =============================================================================

/// Search result pages fetched.
pub static PAGES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mirror_pages_fetched_total", "Search result pages fetched").unwrap()
});

/// Remote requests by result.
pub static REMOTE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirror_remote_requests_total", "Remote requests by result"),
        &["result"], // "success", "api_error", "transport_error"
    )
    .unwrap()
});

/// Remote request latency in seconds, including the retry if one happened.
pub static REMOTE_REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mirror_remote_request_duration_seconds",
            "Latency of remote requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .unwrap()
});

/// Network failures that triggered the single retry.
pub static TRANSPORT_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mirror_transport_retries_total",
        "Requests retried after a network failure",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cycles
        Box::new(SYNC_CYCLES.clone()),
        Box::new(SYNC_CYCLE_DURATION.clone()),
        // Items
        Box::new(ITEMS_PROCESSED.clone()),
        Box::new(ITEMS_FLAGGED.clone()),
        // Remote
        Box::new(PAGES_FETCHED.clone()),
        Box::new(REMOTE_REQUESTS.clone()),
        Box::new(REMOTE_REQUEST_DURATION.clone()),
        Box::new(TRANSPORT_RETRIES.clone()),
    ]
}

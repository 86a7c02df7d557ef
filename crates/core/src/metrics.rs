//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Preparation (item fetch outcomes)
//! - Dispatch (requests sent, completions, in-flight, latency)
//! - Ledger (stale completions)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Preparation Metrics
// =============================================================================

/// Preparation fetches by outcome.
pub static PREPARATION_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ratefire_preparation_results_total",
            "Preparation fetches by outcome",
        ),
        &["outcome"], // "ok", "not_list", "failed", "error"
    )
    .unwrap()
});

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Action requests dispatched.
pub static REQUESTS_DISPATCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ratefire_requests_dispatched_total",
            "Total action requests dispatched",
        ),
        &["competitor"],
    )
    .unwrap()
});

/// Action requests completed by outcome.
pub static REQUESTS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ratefire_requests_completed_total",
            "Total action requests completed",
        ),
        &["competitor", "outcome"], // outcome: "pass", "fail"
    )
    .unwrap()
});

/// Action requests currently awaiting a response.
pub static REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ratefire_requests_in_flight",
        "Action requests awaiting a response",
    )
    .unwrap()
});

/// Action request latency in seconds.
pub static REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ratefire_request_duration_seconds",
            "Action request latency",
        )
        .buckets(vec![
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Ledger Metrics
// =============================================================================

/// Completions that arrived after their run was reset.
pub static STALE_COMPLETIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ratefire_stale_completions_total",
            "Completions whose slot or run was already superseded",
        ),
        &["kind"], // "discarded", "slot_reused"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PREPARATION_RESULTS.clone()),
        Box::new(REQUESTS_DISPATCHED.clone()),
        Box::new(REQUESTS_COMPLETED.clone()),
        Box::new(REQUESTS_IN_FLIGHT.clone()),
        Box::new(REQUEST_DURATION.clone()),
        Box::new(STALE_COMPLETIONS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        REQUESTS_DISPATCHED.with_label_values(&["Andy"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "ratefire_requests_dispatched_total"));
    }
}

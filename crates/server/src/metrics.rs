//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Rate of Fire server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Scheduler state and run counters (collected dynamically)
//!
//! Dispatch and preparation metrics live in `ratefire_core::metrics` and are
//! registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use ratefire_core::SchedulerState;

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
            "ratefire_http_request_duration_seconds",
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
        Opts::new("ratefire_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ratefire_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ratefire_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ratefire_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ratefire_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ratefire_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Scheduler Metrics (collected dynamically)
// =============================================================================

/// Scheduler running state (1 = counting down or running, 0 = idle).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ratefire_scheduler_running",
        "Whether a run is active (1) or the scheduler is idle (0)",
    )
    .unwrap()
});

/// Ticks fired in the current or most recent run.
pub static SCHEDULER_TICKS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ratefire_scheduler_ticks",
        "Ticks fired in the current or most recent run",
    )
    .unwrap()
});

/// Ledger counters per competitor (collected dynamically).
pub static RUN_REQUESTS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "ratefire_run_requests",
            "Requests in the current or most recent run by competitor and status",
        ),
        &["competitor", "status"],
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

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Scheduler
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(SCHEDULER_TICKS.clone()))
        .unwrap();
    registry.register(Box::new(RUN_REQUESTS.clone())).unwrap();

    // Core metrics (preparation, dispatch)
    for metric in ratefire_core::metrics::all_metrics() {
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
/// Called before encoding so the gauges reflect the scheduler and ledger at
/// scrape time.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.session().status().await;
    SCHEDULER_RUNNING.set(match status.state {
        SchedulerState::Idle => 0,
        _ => 1,
    });
    SCHEDULER_TICKS.set(status.ticks as i64);

    // Renamed or removed competitors must not keep stale series.
    RUN_REQUESTS.reset();
    let snapshot = state.session().snapshot().await;
    for competitor in &snapshot.competitors {
        let counters = competitor.counters;
        for (label, value) in [
            ("total", counters.total),
            ("passed", counters.passed),
            ("failed", counters.failed),
            ("running", counters.running),
        ] {
            RUN_REQUESTS
                .with_label_values(&[&competitor.name, label])
                .set(value as i64);
        }
    }
}

/// Normalize a path for metric labels (replace IDs and names with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let competitor_regex = regex_lite::Regex::new(r"/competitors/([^/]+)").unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = competitor_regex.replace_all(&result, |caps: &regex_lite::Captures| {
        if &caps[1] == "setup" {
            "/competitors/setup".to_string()
        } else {
            "/competitors/{name}".to_string()
        }
    });
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

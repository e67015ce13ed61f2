//! Prometheus metrics for lotwatch.
//!
//! Covers the push channel, frame decoding, fallback polling and
//! reconciliation outcomes.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. Registration only fails
//! on duplicate metric names, which is a programming error that should crash
//! at first use rather than silently drop metrics.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_int_counter,
    CounterVec, Gauge, GaugeVec, IntCounter,
};

/// Push channel live state (1 = live, 0 = not live).
pub static WS_LIVE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("lotwatch_ws_live", "Push channel live state (1=live)").unwrap()
});

/// Push channel state machine current state.
/// Labels: state (disconnected/connecting/live/pending_retry)
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "lotwatch_ws_state",
        "Push channel state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Reconnection attempts scheduled after a connection loss.
pub static WS_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lotwatch_ws_reconnect_total",
        "Reconnection attempts scheduled after connection loss",
        &["reason"]
    )
    .unwrap()
});

/// Decoded inbound frames by message kind.
pub static FRAMES_DECODED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lotwatch_frames_decoded_total",
        "Inbound push frames decoded, by message kind",
        &["kind"]
    )
    .unwrap()
});

/// Inbound frames discarded because they could not be decoded.
pub static FRAMES_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "lotwatch_frames_rejected_total",
        "Inbound push frames discarded as malformed"
    )
    .unwrap()
});

/// Fallback poll requests by endpoint and outcome.
pub static POLL_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lotwatch_poll_total",
        "Fallback poll requests, by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

/// Reconciliation results by event and outcome.
pub static RECONCILE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lotwatch_reconcile_total",
        "Reconciliation attempts, by event and outcome",
        &["event", "outcome"]
    )
    .unwrap()
});

/// Number of lots in the last published snapshot.
pub static SNAPSHOT_LOTS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "lotwatch_snapshot_lots",
        "Number of lots in the last published snapshot"
    )
    .unwrap()
});

const WS_STATES: [&str; 4] = ["disconnected", "connecting", "live", "pending_retry"];

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Set push channel state. Only the active state is set to 1.
    pub fn ws_state_set(state: &str) {
        for s in &WS_STATES {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
        WS_LIVE.set(if state == "live" { 1.0 } else { 0.0 });
    }

    /// Record a scheduled reconnection.
    pub fn ws_reconnect(reason: &str) {
        WS_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a decoded frame.
    pub fn frame_decoded(kind: &str) {
        FRAMES_DECODED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a discarded frame.
    pub fn frame_rejected() {
        FRAMES_REJECTED_TOTAL.inc();
    }

    /// Record a poll request outcome ("ok", "error", "stale").
    pub fn poll(endpoint: &str, outcome: &str) {
        POLL_TOTAL.with_label_values(&[endpoint, outcome]).inc();
    }

    /// Record a reconciliation outcome.
    pub fn reconcile(event: &str, outcome: &str) {
        RECONCILE_TOTAL.with_label_values(&[event, outcome]).inc();
    }

    /// Record the size of the published snapshot.
    pub fn snapshot_lots(count: usize) {
        SNAPSHOT_LOTS.set(count as f64);
    }
}

/// Metrics for the feed synchronization core
///
/// Prometheus counters for:
/// - Gateway fetches (page / latest) and their latency
/// - Posts merged into the store
/// - Vote and comment mutations
/// - Trigger signals dropped by the single-flight drivers

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};
use tracing::warn;

lazy_static! {
    // ========== Fetch Metrics ==========

    /// Gateway fetches by kind (page, latest) and status (ok, error kind)
    pub static ref FEED_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_fetches_total",
        "Total number of feed fetches",
        &["kind", "status"]
    )
    .unwrap();

    /// Fetch latency in seconds
    pub static ref FEED_FETCH_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_fetch_duration_seconds",
        "Feed fetch latencies in seconds",
        &["kind"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Store Metrics ==========

    /// Posts actually added to the store, by merge mode
    pub static ref FEED_POSTS_MERGED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_posts_merged_total",
        "Total number of posts added to the feed store",
        &["mode"]
    )
    .unwrap();

    /// Posts currently held
    pub static ref FEED_POSTS_LOADED: IntGauge = register_int_gauge!(
        "feed_posts_loaded",
        "Number of posts in the feed store"
    )
    .unwrap();

    // ========== Mutation Metrics ==========

    /// Votes by direction and outcome (committed, rolled_back)
    pub static ref FEED_VOTES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_votes_total",
        "Total number of vote mutations",
        &["direction", "outcome"]
    )
    .unwrap();

    /// Comment submissions by outcome
    pub static ref FEED_COMMENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_comments_total",
        "Total number of comment submissions",
        &["outcome"]
    )
    .unwrap();

    // ========== Driver Metrics ==========

    /// Trigger signals dropped because the driver was busy or exhausted
    pub static ref FEED_SIGNALS_DROPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_signals_dropped_total",
        "Total number of trigger signals dropped by single-flight drivers",
        &["driver"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record a gateway fetch
pub fn record_fetch(kind: &str, status: &str, duration: f64) {
    FEED_FETCHES_TOTAL.with_label_values(&[kind, status]).inc();
    FEED_FETCH_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(duration);
}

/// Record a merge into the store
pub fn record_merge(mode: &str, added: usize, store_len: usize) {
    FEED_POSTS_MERGED_TOTAL
        .with_label_values(&[mode])
        .inc_by(added as u64);
    FEED_POSTS_LOADED.set(store_len as i64);
}

/// Record a resolved vote mutation
pub fn record_vote(direction: &str, committed: bool) {
    FEED_VOTES_TOTAL
        .with_label_values(&[direction, if committed { "committed" } else { "rolled_back" }])
        .inc();
}

/// Record a resolved comment submission
pub fn record_comment(success: bool) {
    FEED_COMMENTS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

/// Record a trigger signal dropped by a driver
pub fn record_signal_dropped(driver: &str) {
    FEED_SIGNALS_DROPPED_TOTAL.with_label_values(&[driver]).inc();
}

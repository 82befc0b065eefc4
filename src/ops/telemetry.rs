// * Telemetry - Structured Logging and Prometheus Counters
// * Provides log setup for the CLI and run-level counters for debugging

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Listing pages decoded successfully
    pub static ref PAGES_FETCHED_TOTAL: Counter = register_counter!(
        "harvest_pages_fetched_total",
        "Total number of listing pages fetched and decoded"
    ).unwrap();

    // * Page bodies that failed to decode and were retried
    pub static ref FETCH_RETRIES_TOTAL: Counter = register_counter!(
        "harvest_fetch_retries_total",
        "Total number of page fetch retries after decode failures"
    ).unwrap();

    // * Item outcomes (saved / ignored / failed)
    pub static ref ITEMS_TOTAL: CounterVec = register_counter_vec!(
        "harvest_items_total",
        "Total number of processed items by outcome",
        &["outcome"]
    ).unwrap();

    // * Payload bytes downloaded
    pub static ref BYTES_DOWNLOADED_TOTAL: Counter = register_counter!(
        "harvest_bytes_downloaded_total",
        "Total payload bytes downloaded"
    ).unwrap();
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. `json` selects the JSON formatter,
/// otherwise a compact human-readable one is used.
///
/// # Example
/// ```ignore
/// use gallery_harvest::ops::telemetry;
///
/// telemetry::init_tracing("info", false);
/// tracing::info!(url = "https://example.com", "Fetching page");
/// ```
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    }
}

/// Returns the current metrics in the Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_page_fetched() {
    PAGES_FETCHED_TOTAL.inc();
}

pub fn record_fetch_retry() {
    FETCH_RETRIES_TOTAL.inc();
}

pub fn record_item_outcome(outcome: &str) {
    ITEMS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_bytes_downloaded(bytes: usize) {
    BYTES_DOWNLOADED_TOTAL.inc_by(bytes as f64);
}

// * Operations
// * Logging setup and run counters

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    get_metrics_string, init_tracing, record_bytes_downloaded, record_fetch_retry,
    record_item_outcome, record_page_fetched,
};

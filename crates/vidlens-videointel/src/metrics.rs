//! Video Intelligence metrics collection.
//!
//! - Request counters by operation and status
//! - Latency histograms
//! - Retry counters
//! - End-to-end annotation duration

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "videointel_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "videointel_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "videointel_latency_seconds";

    /// Submit-to-done duration of annotation operations.
    pub const OPERATION_DURATION_SECONDS: &str = "videointel_operation_duration_seconds";
}

/// Record metrics for a completed API request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record how long an annotation operation took to finish.
pub fn record_operation_duration(outcome: &str, duration_secs: f64) {
    histogram!(
        names::OPERATION_DURATION_SECONDS,
        "outcome" => outcome.to_string()
    )
    .record(duration_secs);
}

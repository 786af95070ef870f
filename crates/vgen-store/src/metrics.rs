//! Store request metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "vgen_firestore_requests_total";
    pub const REQUEST_DURATION_SECONDS: &str = "vgen_firestore_request_duration_seconds";
    pub const RETRIES_TOTAL: &str = "vgen_firestore_retries_total";
}

/// Record a Firestore request with its outcome.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    let labels = [
        ("operation", operation.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::REQUEST_DURATION_SECONDS, &labels).record(latency_ms / 1000.0);
}

/// Record a retried Firestore operation.
pub fn record_retry(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RETRIES_TOTAL, &labels).increment(1);
}

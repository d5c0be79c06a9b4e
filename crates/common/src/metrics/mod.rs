//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PaperDigest metrics
pub const METRICS_PREFIX: &str = "paperdigest";

/// Buckets for end-to-end summarization latency (dominated by the LLM call)
pub const SUMMARIZE_BUCKETS: &[f64] = &[
    0.5,   // 500ms
    1.0,   // 1s
    2.5,   // 2.5s
    5.0,   // 5s
    10.0,  // 10s
    20.0,  // 20s
    30.0,  // 30s
    60.0,  // 1m
    120.0, // 2m
    180.0, // 3m
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Pipeline metrics
    describe_counter!(
        format!("{}_summaries_total", METRICS_PREFIX),
        Unit::Count,
        "Summarization runs by outcome"
    );

    describe_histogram!(
        format!("{}_summarize_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end summarization latency in seconds"
    );

    describe_histogram!(
        format!("{}_document_bytes", METRICS_PREFIX),
        Unit::Bytes,
        "Size of fetched source documents"
    );

    // LLM metrics
    describe_counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total completion API requests"
    );

    describe_histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Completion API latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record the outcome of one pipeline run.
///
/// `outcome` is `"success"` or the failure kind label.
pub fn record_summarize(duration_secs: f64, outcome: &str) {
    counter!(
        format!("{}_summaries_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(format!("{}_summarize_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record the size of a fetched document
pub fn record_document_size(bytes: usize) {
    histogram!(format!("{}_document_bytes", METRICS_PREFIX)).record(bytes as f64);
}

/// Helper to record completion API metrics
pub fn record_llm(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_llm_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vidlens_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vidlens_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vidlens_http_requests_in_flight";

    // Analysis metrics
    pub const ANALYSES_TOTAL: &str = "vidlens_analyses_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "vidlens_analysis_duration_seconds";
    pub const REPORT_CONFIDENCE: &str = "vidlens_report_confidence_percent";
    pub const UPLOAD_BYTES: &str = "vidlens_upload_bytes";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vidlens_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished analysis.
pub fn record_analysis(strategy: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("strategy", strategy.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the aggregate confidence of a produced report.
pub fn record_report_confidence(strategy: &str, confidence: u8) {
    let labels = [("strategy", strategy.to_string())];
    histogram!(names::REPORT_CONFIDENCE, &labels).record(f64::from(confidence));
}

/// Record the size of an accepted upload.
pub fn record_upload_bytes(bytes: usize) {
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse paths outside the API surface so static assets don't explode cardinality.
fn sanitize_path(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" => path.to_string(),
        p if p.starts_with("/api/") => p.to_string(),
        _ => "/static".to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/api/analyze-video"), "/api/analyze-video");
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(sanitize_path("/js/main.js"), "/static");
        assert_eq!(sanitize_path("/"), "/static");
    }
}

//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::{Captures, Regex};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "rfp_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "rfp_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "rfp_http_requests_in_flight";

    // Lifecycle metrics
    pub const RFPS_CREATED_TOTAL: &str = "rfp_rfps_created_total";
    pub const RFPS_PUBLISHED_TOTAL: &str = "rfp_rfps_published_total";
    pub const RESPONSES_SUBMITTED_TOTAL: &str = "rfp_responses_submitted_total";
    pub const RESPONSES_REVIEWED_TOTAL: &str = "rfp_responses_reviewed_total";
    pub const GUARD_REJECTIONS_TOTAL: &str = "rfp_guard_rejections_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "rfp_rate_limit_hits_total";
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

pub fn record_rfp_created() {
    counter!(names::RFPS_CREATED_TOTAL).increment(1);
}

pub fn record_rfp_published() {
    counter!(names::RFPS_PUBLISHED_TOTAL).increment(1);
}

pub fn record_response_submitted() {
    counter!(names::RESPONSES_SUBMITTED_TOTAL).increment(1);
}

/// `outcome` is the status the response moved to.
pub fn record_response_reviewed(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RESPONSES_REVIEWED_TOTAL, &labels).increment(1);
}

/// Record a lifecycle guard refusal, labelled by its reason code.
pub fn record_guard_rejection(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::GUARD_REJECTIONS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid pattern")
});

static ENTITY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(rfps|responses)/([^/]+)").expect("valid entity pattern")
});

/// Sanitize path for metrics labels so entity ids collapse to `:id`.
fn sanitize_path(path: &str) -> String {
    let path = UUID_RE.replace_all(path, ":id");
    // Named sub-routes share the id position and must stay distinct.
    let path = ENTITY_ID_RE.replace_all(&path, |caps: &Captures<'_>| match &caps[2] {
        "browse" | "my" | ":id" => caps[0].to_string(),
        _ => format!("/{}/:id", &caps[1]),
    });
    path.into_owned()
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
        assert_eq!(
            sanitize_path("/api/rfps/550e8400-e29b-41d4-a716-446655440000/publish"),
            "/api/rfps/:id/publish"
        );
        assert_eq!(
            sanitize_path("/api/responses/some-legacy-id/approve"),
            "/api/responses/:id/approve"
        );
        assert_eq!(sanitize_path("/api/rfps/browse"), "/api/rfps/browse");
        assert_eq!(sanitize_path("/api/responses/my"), "/api/responses/my");
        assert_eq!(sanitize_path("/api/rfps"), "/api/rfps");
    }
}

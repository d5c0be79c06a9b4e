//! Per-request Prometheus metrics

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use paperdigest_common::metrics::RequestMetrics;

/// Record count and latency for every request, labelled by route template
pub async fn track_requests(request: Request, next: Next) -> Response {
    // Route templates keep label cardinality bounded (no raw ids)
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}

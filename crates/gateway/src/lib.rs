//! PaperDigest API Gateway
//!
//! HTTP surface for the summarizer:
//! - Bearer-token authentication
//! - Summary creation and retrieval routes
//! - Observability (logging, metrics, request ids)

pub mod handlers;
pub mod middleware;

use axum::{
    extract::FromRef,
    routing::get,
    Router,
};
use paperdigest_common::{auth::JwtManager, config::AppConfig, db::SummaryRepository};
use paperdigest_summarizer::SummarizationPipeline;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<SummarizationPipeline>,
    pub repository: Arc<dyn SummaryRepository>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.jwt)
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Summary endpoints
        .route(
            "/summaries",
            get(handlers::summaries::list_summaries).post(handlers::summaries::summarize),
        )
        .route("/summaries/{id}", get(handlers::summaries::get_summary));

    // Layers run bottom-up: the request id must exist before tracing sees it
    Router::new()
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

//! PaperDigest API Gateway
//!
//! Wires configuration, storage, the summarization pipeline and the HTTP
//! router together, then serves until Ctrl+C or SIGTERM.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use paperdigest_common::{
    auth::JwtManager,
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, InMemorySummaryRepository, PgSummaryRepository, SummaryRepository},
    errors::AppError,
    metrics,
};
use paperdigest_gateway::{create_router, AppState};
use paperdigest_summarizer::{
    ChatCompletionClient, HttpDocumentFetcher, PdfTextExtractor, SummarizationPipeline,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::Notify};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config.observability);
    config.validate()?;

    info!("Starting PaperDigest API Gateway v{}", paperdigest_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets_for_metric(
                Matcher::Suffix("summarize_duration_seconds".to_string()),
                metrics::SUMMARIZE_BUCKETS,
            )?
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }
    metrics::register_metrics();

    // Summary store
    let repository: Arc<dyn SummaryRepository> = if config.uses_memory_store() {
        warn!("Using in-memory summary store; summaries are lost on restart");
        Arc::new(InMemorySummaryRepository::new())
    } else {
        let db = DbPool::new(&config.database).await?;
        if config.database.run_migrations {
            db.migrate().await?;
        }
        Arc::new(PgSummaryRepository::new(db))
    };

    let jwt_secret = config
        .auth
        .jwt_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Configuration {
            message: "auth.jwt_secret must be set".to_string(),
        })?;
    let jwt = Arc::new(JwtManager::new(jwt_secret, config.auth.jwt_expiration_secs));

    if config.llm.api_key.is_none() {
        warn!("No LLM API key configured; summarize requests will fail");
    }

    // Pipeline collaborators
    let pipeline = SummarizationPipeline::new(
        Arc::new(HttpDocumentFetcher::new(&config.storage)?),
        Arc::new(PdfTextExtractor),
        Arc::new(ChatCompletionClient::new(config.llm.clone())?),
        Arc::clone(&repository),
    )
    .with_llm_timeout(config.llm_timeout());

    let state = AppState {
        config: Arc::clone(&config),
        pipeline: Arc::new(pipeline),
        repository,
        jwt,
    };

    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::Configuration {
            message: format!("invalid server address: {}", e),
        })?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = Arc::clone(&shutdown);
            async move {
                shutdown_signal().await;
                shutdown.notify_one();
            }
        })
        .into_future();

    // In-flight requests get a bounded grace period once the signal arrives
    let grace = config.shutdown_timeout();
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out"),
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

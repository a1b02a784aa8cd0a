//! HTTP server implementation using Axum.

use std::sync::Arc;

use autosend_core::SentMessages;
use autosend_core::config::GatewayConfig;
use autosend_core::shutdown::ShutdownSignal;
use autosend_scheduler::SchedulerHandle;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    /// Start/stop control for the dispatch scheduler.
    pub scheduler: SchedulerHandle,
    /// Read side of the delivery cache.
    pub sent: Arc<dyn SentMessages>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/start", post(super::routes::start_dispatch))
        .route("/stop", post(super::routes::stop_dispatch))
        .route("/messages", get(super::routes::list_sent_messages))
        .route("/health", get(super::routes::health_check))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(Arc::new(state))
}

/// Bind and serve until `shutdown` fires.
pub async fn serve(
    config: &GatewayConfig,
    state: AppState,
    mut shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let cause = shutdown.wait().await;
            tracing::info!("🌐 Gateway shutting down: {cause}");
        })
        .await
}

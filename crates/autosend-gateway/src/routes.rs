//! API route handlers for the gateway.

use std::sync::Arc;

use autosend_core::DeliveryRecord;
use autosend_scheduler::SchedulerError;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::AppState;

/// Health check endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Resume periodic dispatch.
pub async fn start_dispatch(State(state): State<Arc<AppState>>) -> Response {
    control_response("start", state.scheduler.start().await)
}

/// Pause periodic dispatch.
pub async fn stop_dispatch(State(state): State<Arc<AppState>>) -> Response {
    control_response("stop", state.scheduler.stop().await)
}

fn control_response(action: &str, result: Result<(), SchedulerError>) -> Response {
    match result {
        Ok(()) => {
            tracing::info!("🎛️ Dispatcher {action} accepted");
            (StatusCode::OK, "OK").into_response()
        }
        Err(e) => {
            tracing::warn!("⚠️ Dispatcher {action} rejected: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

/// List every delivery recorded in the cache.
pub async fn list_sent_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeliveryRecord>>, (StatusCode, Json<serde_json::Value>)> {
    state.sent.list().await.map(Json).map_err(|e| {
        tracing::error!("❌ Failed to list sent messages: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
    })
}

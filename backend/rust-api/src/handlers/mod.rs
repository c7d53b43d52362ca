use axum::{extract::State, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics;
use crate::models::LevelConfig;
use crate::services::AppState;

pub mod claims;
pub mod sessions;
pub mod sse;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "claimgame-api",
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "sessions": "healthy",
            "timer": "healthy",
        }
    }))
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler() -> Result<String, ApiError> {
    metrics::render_metrics().map_err(|e| {
        tracing::error!("Failed to render metrics: {}", e);
        ApiError::internal(format!("Failed to render metrics: {}", e))
    })
}

/// Registry size, counting sessions of every status.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "active_sessions": state.sessions.count().await,
        "system": "ready",
    }))
}

pub async fn list_levels() -> Json<&'static [LevelConfig]> {
    Json(LevelConfig::all())
}

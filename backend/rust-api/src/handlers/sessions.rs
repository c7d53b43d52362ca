use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    models::{claim::ClaimSubmissionRequest, CreateSessionRequest, UpdateSessionRequest},
    services::AppState,
};

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    tracing::info!(level_id = req.level_id, "Creating session");

    let session = state.sessions.create_session(req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.get_session(&session_id).await?;
    Ok(Json(session))
}

pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<UpdateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let session = state.sessions.update_session(&session_id, req).await?;
    Ok(Json(session))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.delete_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_claim(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<ClaimSubmissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(session_id = %session_id, "Submitting claim");
    let response = state.sessions.submit_claim(&session_id, &req.claim).await?;
    Ok(Json(response))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while setting up a game session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown level: {0}")]
    UnknownLevel(u8),
    #[error("player name must not be empty")]
    EmptyPlayerName,
}

/// Errors returned by the HTTP client talking to the game API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Connection problems and 5xx answers are worth another attempt, 4xx are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            ClientError::Status { status, .. } => status.is_server_error(),
            ClientError::Decode(_) => false,
        }
    }
}

/// Errors of the server-side session registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session is closed: {0}")]
    Closed(String),
    #[error("{0}")]
    InvalidClaim(String),
    #[error("{0}")]
    InvalidRequest(String),
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "SESSION_NOT_FOUND",
            ApiError::Conflict(_) => "SESSION_CLOSED",
            ApiError::Unprocessable(_) => "CLAIM_VALIDATION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        let message = err.to_string();
        match err {
            SessionStoreError::NotFound(_) => ApiError::NotFound(message),
            SessionStoreError::Closed(_) => ApiError::Conflict(message),
            SessionStoreError::InvalidClaim(_) => ApiError::Unprocessable(message),
            SessionStoreError::InvalidRequest(_) => ApiError::BadRequest(message),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Validation error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        let body = json!({
            "error": code,
            "message": message,
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_statuses() {
        let cases = [
            (
                SessionStoreError::NotFound("session_1".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                SessionStoreError::Closed("session_1".into()),
                StatusCode::CONFLICT,
            ),
            (
                SessionStoreError::InvalidClaim("too short".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                SessionStoreError::InvalidRequest("bad name".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn client_status_errors_classify_transience() {
        let server = ClientError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let client = ClientError::Status {
            status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
            body: String::new(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
    }
}

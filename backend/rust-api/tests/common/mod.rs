#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use claimgame_api::{
    config::{Config, GameSettings, LogFormat},
    create_router,
    services::AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        api_base_url: "http://127.0.0.1:0".to_string(),
        request_timeout_ms: 2000,
        max_stream_seconds: 3600,
        log_format: LogFormat::Pretty,
        game: GameSettings {
            settle_delay_ms: 50,
            tick_interval_ms: 1000,
        },
    }
}

pub fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    create_router(Arc::new(AppState::new(test_config())))
}

/// Serves a fresh app on an ephemeral port and returns its base URL.
pub async fn spawn_server() -> String {
    let app = create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

pub async fn create_session(app: &Router, player_name: &str, level_id: u8) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/game/session",
        Some(serde_json::json!({ "player_name": player_name, "level_id": level_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    body["session_id"].as_str().unwrap().to_string()
}

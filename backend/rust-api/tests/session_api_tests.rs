use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_session, create_test_app, send_json};

#[tokio::test]
async fn test_create_session_applies_level_rules() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/game/session",
        Some(json!({ "player_name": "김철수", "level_id": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["session_id"].as_str().unwrap().starts_with("session_"));
    assert_eq!(body["player_name"], "김철수");
    assert_eq!(body["status"], "active");
    assert_eq!(body["required_claim_count"], 5);
    assert_eq!(body["time_limit_seconds"], 900);
    assert_eq!(body["claim_count"], 0);
}

#[tokio::test]
async fn test_create_session_rejects_invalid_input() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/game/session",
        Some(json!({ "player_name": "", "level_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert_eq!(body["status"], 400);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/game/session",
        Some(json!({ "player_name": "player", "level_id": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_body() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/game/session",
        Some(json!({ "player": "missing fields" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Failed to parse JSON request body"));
}

#[tokio::test]
async fn test_get_unknown_session_is_not_found() {
    let app = create_test_app();

    let (status, body) = send_json(&app, "GET", "/api/game/session/session_00000000", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_submit_claim_validates_and_counts() {
    let app = create_test_app();
    let session_id = create_session(&app, "player", 2).await;
    let submit_uri = format!("/api/game/session/{}/submit", session_id);

    let (status, body) = send_json(
        &app,
        "POST",
        &submit_uri,
        Some(json!({ "claim": "짧은 청구항" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "CLAIM_VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("짧습니다"));

    let (status, body) = send_json(
        &app,
        "POST",
        &submit_uri,
        Some(json!({ "claim": "배터리 장치는 양극, 음극, 전해질을 포함한다" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], session_id.as_str());
    assert_eq!(body["claim_number"], 1);
    assert_eq!(body["is_valid"], true);

    let (_, body) = send_json(&app, "GET", &format!("/api/game/session/{}", session_id), None).await;
    assert_eq!(body["claim_count"], 1);
}

#[tokio::test]
async fn test_completed_session_rejects_claims() {
    let app = create_test_app();
    let session_id = create_session(&app, "player", 1).await;
    let uri = format!("/api/game/session/{}", session_id);

    let (status, body) = send_json(&app, "PATCH", &uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("{}/submit", uri),
        Some(json!({ "claim": "배터리 장치는 양극, 음극, 전해질을 포함한다" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SESSION_CLOSED");
}

#[tokio::test]
async fn test_patch_renames_player() {
    let app = create_test_app();
    let session_id = create_session(&app, "player", 1).await;

    let (status, body) = send_json(
        &app,
        "PATCH",
        &format!("/api/game/session/{}", session_id),
        Some(json!({ "player_name": "  새 이름 " })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_name"], "새 이름");
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_delete_session() {
    let app = create_test_app();
    let session_id = create_session(&app, "player", 1).await;
    let uri = format!("/api/game/session/{}", session_id);

    let (status, _) = send_json(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_levels_and_health() {
    let app = create_test_app();

    let (status, body) = send_json(&app, "GET", "/api/levels", None).await;
    assert_eq!(status, StatusCode::OK);
    let levels = body.as_array().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[1]["required_claim_count"], 3);
    assert_eq!(levels[2]["time_limit_seconds"], 900);

    let (status, body) = send_json(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["components"].is_object());
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_http_counters() {
    let app = create_test_app();
    let _ = send_json(&app, "GET", "/api/levels", None).await;

    let (status, body) = send_json(&app, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("http_requests_total"));
}

#[tokio::test]
async fn test_stats_track_registry_size() {
    let app = create_test_app();

    let first = create_session(&app, "player", 1).await;
    let second = create_session(&app, "player", 2).await;

    let (status, body) = send_json(&app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_sessions"], 2);
    assert_eq!(body["system"], "ready");

    for session_id in [first, second] {
        let (status, _) = send_json(
            &app,
            "DELETE",
            &format!("/api/game/session/{}", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, body) = send_json(&app, "GET", "/api/stats", None).await;
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn test_validate_claim_endpoint() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/claims/validate",
        Some(json!({ "claim": "짧은 청구항" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claim"], "짧은 청구항");
    assert_eq!(body["is_valid"], false);
    assert!(body["errors"][0].as_str().unwrap().contains("짧습니다"));
    assert!(body["warnings"].as_array().unwrap().is_empty());

    let no_keyword = "가".repeat(25);
    let (_, body) = send_json(
        &app,
        "POST",
        "/api/claims/validate",
        Some(json!({ "claim": no_keyword })),
    )
    .await;
    assert_eq!(body["is_valid"], true);
    assert!(body["errors"].as_array().unwrap().is_empty());
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);

    let (_, body) = send_json(
        &app,
        "POST",
        "/api/claims/validate",
        Some(json!({ "claim": "배터리 장치는 양극, 음극, 전해질을 포함한다" })),
    )
    .await;
    assert_eq!(body["is_valid"], true);
    assert!(body["warnings"].as_array().unwrap().is_empty());
    assert_eq!(body["info"].as_array().unwrap().len(), 1);
}

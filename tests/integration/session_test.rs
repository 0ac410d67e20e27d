//! Integration tests for listing and revoking the caller's sessions.

mod helpers;

use http::{Method, StatusCode};
use serde_json::json;

use authgate_entity::user::UserRole;

use helpers::{CLIENT_IP, TestApp, USER_AGENT};

#[tokio::test]
async fn test_sessions_listed_newest_first_with_current_flag() {
    let app = TestApp::new().await;
    app.add_user("dana@example.com", UserRole::Client).await;

    let _first = app.login("dana@example.com").await;
    let _second = app.login("dana@example.com").await;
    let third = app.login("dana@example.com").await;

    let (status, body) = app
        .request(Method::GET, "/api/sessions", third["access_token"].as_str(), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0]["id"], third["session_id"]);
    assert_eq!(sessions[0]["current"], true);
    assert!(sessions[1..].iter().all(|s| s["current"] == false));
    assert_eq!(sessions[0]["device"], USER_AGENT);
    assert_eq!(sessions[0]["ip"], CLIENT_IP);
}

#[tokio::test]
async fn test_remove_others_keeps_only_current_session() {
    let app = TestApp::new().await;
    app.add_user("erin@example.com", UserRole::Client).await;

    let other = app.login("erin@example.com").await;
    let current = app.login("erin@example.com").await;
    let access = current["access_token"].as_str();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/sessions/revoke",
            access,
            Some(json!({ "remove_others": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], 1);

    let (status, _) = app
        .request(Method::GET, "/api/auth/me", other["access_token"].as_str(), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.request(Method::GET, "/api/sessions", access, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_revoke_by_id_ignores_sessions_of_other_users() {
    let app = TestApp::new().await;
    app.add_user("frank@example.com", UserRole::Client).await;
    app.add_user("grace@example.com", UserRole::Client).await;

    let frank = app.login("frank@example.com").await;
    let grace = app.login("grace@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/sessions/revoke",
            frank["access_token"].as_str(),
            Some(json!({ "session_ids": [grace["session_id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], 0);

    let (status, _) = app
        .request(Method::GET, "/api/auth/me", grace["access_token"].as_str(), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_revoke_without_targets_is_invalid_input() {
    let app = TestApp::new().await;
    app.add_user("heidi@example.com", UserRole::Client).await;
    let tokens = app.login("heidi@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/sessions/revoke",
            tokens["access_token"].as_str(),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_revoking_current_session_by_id_logs_out() {
    let app = TestApp::new().await;
    app.add_user("ivan@example.com", UserRole::Client).await;
    let tokens = app.login("ivan@example.com").await;
    let access = tokens["access_token"].as_str();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/sessions/revoke",
            access,
            Some(json!({ "session_ids": [tokens["session_id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], 1);

    let (status, _) = app.request(Method::GET, "/api/sessions", access, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

//! Integration tests for login, refresh rotation, logout, and bearer auth.

mod helpers;

use http::{Method, StatusCode};
use serde_json::json;

use authgate_entity::user::UserRole;

use helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_login_refresh_logout_lifecycle() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", UserRole::Client).await;

    let first = app.login("alice@example.com").await;
    assert_eq!(first["token_type"], "Bearer");
    let session_id = first["session_id"].as_str().unwrap().to_string();

    let (status, me) = app
        .request(Method::GET, "/api/auth/me", first["access_token"].as_str(), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "alice@example.com");
    assert_eq!(me["data"]["session_id"], session_id.as_str());

    let (status, second) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["session_id"], session_id.as_str());
    assert_ne!(second["data"]["refresh_token"], first["refresh_token"]);

    // A rotated refresh token is single use.
    let (status, replay) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay["error"], "UNAUTHORIZED");

    let access = second["data"]["access_token"].as_str().unwrap();
    let (status, _) = app.request(Method::POST, "/api/auth/logout", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": second["data"]["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_email_and_bad_password_are_indistinguishable() {
    let app = TestApp::new().await;
    app.add_user("bob@example.com", UserRole::Client).await;

    let (s1, wrong_password) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "bob@example.com", "password": "not-the-password" })),
        )
        .await;
    let (s2, unknown_email) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_malformed_requests_are_invalid_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "not-an-email", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = app
        .request(Method::POST, "/api/auth/refresh", None, Some(json!({ "token": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_bearer_token_is_required() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app
        .request(Method::GET, "/api/auth/me", Some("garbage.token.value"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_types_are_not_interchangeable() {
    let app = TestApp::new().await;
    app.add_user("carol@example.com", UserRole::Client).await;
    let tokens = app.login("carol@example.com").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": tokens["access_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/auth/me", tokens["refresh_token"].as_str(), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_without_database() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"], "ok");
    assert_eq!(body["database"], "disabled");
}

#[tokio::test]
async fn test_registered_account_needs_activation() {
    let app = TestApp::new().await;
    app.add_user("admin@example.com", UserRole::Admin).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "erin@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "client");
    assert_eq!(body["data"]["status"], "inactive");
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "erin@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let admin = app.access_token("admin@example.com").await;
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{user_id}/status"),
            Some(&admin),
            Some(json!({ "status": "active" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let tokens = app.login("erin@example.com").await;
    assert_eq!(tokens["token_type"], "Bearer");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let app = TestApp::new().await;
    app.add_user("frank@example.com", UserRole::Client).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "FRANK@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "grace@example.com", "password": "password1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_password_change_revokes_existing_tokens() {
    let app = TestApp::new().await;
    app.add_user("heidi@example.com", UserRole::Client).await;
    let first = app.login("heidi@example.com").await;
    let other = app.login("heidi@example.com").await;
    let access = first["access_token"].as_str().unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/password",
            Some(access),
            Some(json!({ "current_password": "wrong guess", "new_password": "orbit fennel quarry 2049" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/password",
            Some(access),
            Some(json!({ "current_password": PASSWORD, "new_password": "orbit fennel quarry 2049" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sessions_revoked"], 2);

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": other["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "heidi@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let tokens = app.login_with("heidi@example.com", "orbit fennel quarry 2049").await;
    assert_eq!(tokens["token_type"], "Bearer");
}

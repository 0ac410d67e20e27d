//! Integration tests for permission checks and cache invalidation.

mod helpers;

use http::{Method, StatusCode};
use serde_json::json;

use authgate_entity::user::UserRole;

use helpers::TestApp;

#[tokio::test]
async fn test_client_cannot_reach_admin_routes() {
    let app = TestApp::new().await;
    let client = app.add_user("judy@example.com", UserRole::Client).await;
    let token = app.access_token("judy@example.com").await;

    let (status, body) = app
        .request(Method::GET, &format!("/api/admin/users/{}", client.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, _) = app
        .request(Method::GET, "/api/admin/roles/client/permissions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_suspension_revokes_sessions_and_blocks_login() {
    let app = TestApp::new().await;
    app.add_user("admin@example.com", UserRole::Admin).await;
    let target = app.add_user("mallory@example.com", UserRole::Client).await;

    let admin = app.access_token("admin@example.com").await;
    let victim = app.access_token("mallory@example.com").await;

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{}/status", target.id),
            Some(&admin),
            Some(json!({ "status": "suspended" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(&victim), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "mallory@example.com", "password": helpers::PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_role_change_is_visible_on_next_request() {
    let app = TestApp::new().await;
    app.add_user("admin@example.com", UserRole::Admin).await;
    let target = app.add_user("oscar@example.com", UserRole::Client).await;

    let admin = app.access_token("admin@example.com").await;
    let token = app.access_token("oscar@example.com").await;

    let uri = format!("/api/admin/users/{}", target.id);
    let (status, _) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("{uri}/role"),
            Some(&admin),
            Some(json!({ "role": "operator" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "operator");
}

#[tokio::test]
async fn test_revoked_role_permission_takes_effect() {
    let app = TestApp::new().await;
    app.add_user("admin@example.com", UserRole::Admin).await;
    app.add_user("peggy@example.com", UserRole::Client).await;

    let admin = app.access_token("admin@example.com").await;
    let client = app.access_token("peggy@example.com").await;

    let (status, _) = app.request(Method::GET, "/api/sessions", Some(&client), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::DELETE,
            "/api/admin/roles/client/permissions/session:read",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);

    let (status, _) = app.request(Method::GET, "/api/sessions", Some(&client), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/admin/roles/client/permissions",
            Some(&admin),
            Some(json!({ "permission": "session:read" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);

    let (status, body) = app
        .request(Method::GET, "/api/admin/roles/client/permissions", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let granted: Vec<&str> = body["data"]["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p.as_str())
        .collect();
    assert!(granted.contains(&"session:read"));

    let (status, _) = app.request(Method::GET, "/api/sessions", Some(&client), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_user_loses_access() {
    let app = TestApp::new().await;
    app.add_user("admin@example.com", UserRole::Admin).await;
    let target = app.add_user("trent@example.com", UserRole::Client).await;

    let admin = app.access_token("admin@example.com").await;
    let token = app.access_token("trent@example.com").await;

    let uri = format!("/api/admin/users/{}", target.id);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    app.settle().await;

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.request(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_admin_guards_on_self_and_bad_paths() {
    let app = TestApp::new().await;
    let admin_user = app.add_user("admin@example.com", UserRole::Admin).await;
    let admin = app.access_token("admin@example.com").await;

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", admin_user.id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(Method::GET, "/api/admin/users/not-a-uuid", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, _) = app
        .request(Method::GET, "/api/admin/roles/superuser/permissions", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_creates_and_lists_users() {
    let app = TestApp::new().await;
    app.add_user("admin@example.com", UserRole::Admin).await;
    app.add_user("ivan@example.com", UserRole::Operator).await;
    app.add_user("judy@example.com", UserRole::Client).await;
    let admin = app.access_token("admin@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/admin/users",
            Some(&admin),
            Some(json!({
                "email": "ken@example.com",
                "password": helpers::PASSWORD,
                "role": "operator",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "operator");
    assert_eq!(body["data"]["status"], "active");
    app.login("ken@example.com").await;

    let (status, body) = app
        .request(Method::GET, "/api/admin/users?role=operator&page_size=1", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .request(Method::GET, "/api/admin/users?search=JUDY", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["email"], "judy@example.com");

    let (status, body) = app
        .request(Method::GET, "/api/admin/users?role=superuser", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_user_listing_and_creation_need_permissions() {
    let app = TestApp::new().await;
    app.add_user("ivan@example.com", UserRole::Operator).await;
    app.add_user("judy@example.com", UserRole::Client).await;
    let operator = app.access_token("ivan@example.com").await;
    let client = app.access_token("judy@example.com").await;

    let (status, _) = app
        .request(Method::GET, "/api/admin/users", Some(&client), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(Method::GET, "/api/admin/users", Some(&operator), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 2);

    // user:read does not grant user:write.
    let (status, body) = app
        .request(
            Method::POST,
            "/api/admin/users",
            Some(&operator),
            Some(json!({ "email": "leo@example.com", "password": helpers::PASSWORD, "role": "client" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

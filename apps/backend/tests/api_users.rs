//! Users and login API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL before running.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;
use serde_json::json;

use common::{fixtures, TestContext, TEST_PASSWORD};

/// Test registering and logging in with the new account.
#[tokio::test]
#[ignore = "requires database"]
async fn test_register_then_login() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_name = fixtures::unique_name("reg");

    let response = server
        .post("/api/users/register")
        .json(&fixtures::register_request(&user_name, TEST_PASSWORD))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let user_id = body["id"].as_i64().unwrap();
    assert_eq!(body["user_name"], user_name.as_str());
    assert!(body.get("password_hash").is_none());

    let response = server
        .post("/api/login/access-token")
        .form(&[("username", user_name.as_str()), ("password", TEST_PASSWORD)])
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let response = server
        .get("/api/users/me")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], user_id);

    ctx.cleanup_user(user_id).await;
}

/// Test duplicate user names are rejected.
#[tokio::test]
#[ignore = "requires database"]
async fn test_register_duplicate_user_name() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, user_name, _) = ctx.create_test_user(false).await;

    let response = server
        .post("/api/users/register")
        .json(&json!({
            "user_name": user_name,
            "email": "someone-else@example.com",
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    ctx.cleanup_user(user_id).await;
}

/// Test wrong password returns 401.
#[tokio::test]
#[ignore = "requires database"]
async fn test_login_wrong_password() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, user_name, _) = ctx.create_test_user(false).await;

    let response = server
        .post("/api/login/access-token")
        .form(&[("username", user_name.as_str()), ("password", "not-the-password")])
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup_user(user_id).await;
}

/// Test inactive users cannot log in.
#[tokio::test]
#[ignore = "requires database"]
async fn test_login_inactive_user() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, user_name, _) = ctx.create_test_user(false).await;

    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user_id)
        .execute(ctx.db.pool())
        .await
        .unwrap();

    let response = server
        .post("/api/login/access-token")
        .form(&[("username", user_name.as_str()), ("password", TEST_PASSWORD)])
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup_user(user_id).await;
}

/// Test protected routes reject missing and unknown tokens.
#[tokio::test]
#[ignore = "requires database"]
async fn test_protected_route_requires_token() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/api/users/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/users/me")
        .add_header(AUTHORIZATION, TestContext::auth_header_value("bogus"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Test expired tokens are rejected.
#[tokio::test]
#[ignore = "requires database"]
async fn test_expired_token_rejected() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, _, token) = ctx.create_test_user(false).await;

    sqlx::query("UPDATE access_tokens SET expires_at = NOW() - INTERVAL '1 minute' WHERE user_id = $1")
        .bind(user_id)
        .execute(ctx.db.pool())
        .await
        .unwrap();

    let response = server
        .get("/api/users/me")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup_user(user_id).await;
}

/// Test only superusers can list users.
#[tokio::test]
#[ignore = "requires database"]
async fn test_list_users_requires_superuser() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, _, token) = ctx.create_test_user(false).await;
    let (admin_id, _, admin_token) = ctx.create_test_user(true).await;

    let response = server
        .get("/api/users")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .get("/api/users")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&admin_token))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let users = body["users"].as_array().unwrap();
    assert!(users.iter().any(|u| u["id"] == user_id));

    ctx.cleanup_user(user_id).await;
    ctx.cleanup_user(admin_id).await;
}

/// Test updating and deleting the current user.
#[tokio::test]
#[ignore = "requires database"]
async fn test_update_and_delete_me() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, _, token) = ctx.create_test_user(false).await;

    let response = server
        .put("/api/users/me")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&json!({ "full_name": "Yamada Taro" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["full_name"], "Yamada Taro");

    let response = server
        .delete("/api/users/me")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/users/me")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup_user(user_id).await;
}

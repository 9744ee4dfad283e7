//! Authentication API Tests
//!
//! These run against the full router; every case here fails validation or
//! token checks before any database query is issued.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::{expired_token_for, forged_token_for, token_for, TestApp};

/// Test registration fails with invalid email
#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    // Arrange
    let app = TestApp::new().await;
    let body = json!({
        "email": "not-an-email",
        "username": "testuser",
        "password": "ValidPassword123!"
    });

    // Act
    let response = app
        .post_json("/api/v1/auth/register", &body.to_string())
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test registration fails with short password
#[tokio::test]
async fn test_register_with_short_password_fails() {
    // Arrange
    let app = TestApp::new().await;
    let body = json!({
        "email": "test@example.com",
        "username": "testuser",
        "password": "short"
    });

    // Act
    let response = app
        .post_json("/api/v1/auth/register", &body.to_string())
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test registration fails with a one-character username
#[tokio::test]
async fn test_register_with_short_username_fails() {
    // Arrange
    let app = TestApp::new().await;
    let body = json!({
        "email": "test@example.com",
        "username": "x",
        "password": "ValidPassword123!"
    });

    // Act
    let response = app
        .post_json("/api/v1/auth/register", &body.to_string())
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test login rejects a malformed email before touching credentials
#[tokio::test]
async fn test_login_with_invalid_email_fails() {
    // Arrange
    let app = TestApp::new().await;
    let body = json!({
        "email": "not-an-email",
        "password": "ValidPassword123!"
    });

    // Act
    let response = app.post_json("/api/v1/auth/login", &body.to_string()).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test authenticated endpoint requires token
#[tokio::test]
async fn test_protected_endpoint_requires_auth() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let response = app.get("/api/v1/users/@me").await;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Test a non-Bearer authorization header is rejected
#[tokio::test]
async fn test_malformed_authorization_header_is_rejected() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/v1/users/@me")
                .header("Authorization", "Basic dXNlcjpwYXNz")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Test an expired token is rejected
#[tokio::test]
async fn test_expired_token_is_rejected() {
    // Arrange
    let app = TestApp::new().await;
    let token = expired_token_for(1);

    // Act
    let response = app.get_auth("/api/v1/users/@me", &token).await;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Test a token signed with the wrong secret is rejected
#[tokio::test]
async fn test_forged_token_is_rejected() {
    // Arrange
    let app = TestApp::new().await;
    let token = forged_token_for(1);

    // Act
    let response = app.get_auth("/api/v1/users/@me", &token).await;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Error responses carry the structured payload shape
#[tokio::test]
async fn test_error_payload_shape() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(1);

    // Act: a valid token but a malformed target id fails fast with 400
    let response = app
        .get_auth("/api/v1/users/not-a-number/profile", &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json.get("code").is_some());
    assert!(json.get("message").is_some());
}

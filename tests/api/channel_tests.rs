//! Channel API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{token_for, TestApp};

/// A non-numeric channel id is a bad request, not a lookup
#[tokio::test]
async fn test_invalid_channel_id_is_rejected() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(1);

    // Act
    let response = app
        .get_auth("/api/v1/channels/not-a-number/messages", &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Message history requires authentication
#[tokio::test]
async fn test_channel_history_requires_auth() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/channels/1/messages").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// The REST send fallback rejects an empty content field
#[tokio::test]
async fn test_send_with_empty_content_fails() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(1);
    let body = json!({ "content": "" });

    // Act
    let response = app
        .post_json_auth("/api/v1/channels/1/messages", &body.to_string(), &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Channel creation rejects an empty name
#[tokio::test]
async fn test_create_channel_with_empty_name_fails() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(1);
    let body = json!({ "name": "" });

    // Act
    let response = app
        .post_json_auth(
            "/api/v1/communities/1/channels",
            &body.to_string(),
            &token,
        )
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//! Conversation API Tests
//!
//! Room-key parsing and participant checks are pure functions of the key, so
//! every rejection here happens before the repository is reached.

use axum::http::StatusCode;
use serde_json::json;
use test_case::test_case;

use crate::common::{token_for, TestApp};

/// Malformed or non-canonical room keys are rejected outright
#[test_case("not-a-key" ; "no separator")]
#[test_case("7_13" ; "non canonical ordering")]
#[test_case("abc_def" ; "non numeric ids")]
#[test_case("42" ; "single id")]
#[tokio::test]
async fn test_malformed_room_key_is_rejected(key: &str) {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(7);

    // Act
    let response = app
        .get_auth(&format!("/api/v1/conversations/{}/messages", key), &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A user who is not one of the two participants cannot read history
#[tokio::test]
async fn test_non_participant_cannot_read_history() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(99);

    // Act: key "1_2" encodes participants 1 and 2
    let response = app
        .get_auth("/api/v1/conversations/1_2/messages", &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// A non-participant cannot inject into a conversation either
#[tokio::test]
async fn test_non_participant_cannot_send() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(99);
    let body = json!({ "content": "intrusion" });

    // Act
    let response = app
        .post_json_auth("/api/v1/conversations/1_2/messages", &body.to_string(), &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Whitespace-only text is rejected before anything is persisted
#[tokio::test]
async fn test_whitespace_only_content_is_rejected() {
    // Arrange
    let app = TestApp::new().await;
    let token = token_for(1);
    let body = json!({ "content": "   \t " });

    // Act
    let response = app
        .post_json_auth("/api/v1/conversations/1_2/messages", &body.to_string(), &token)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// History requires authentication
#[tokio::test]
async fn test_history_requires_auth() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/conversations/1_2/messages").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

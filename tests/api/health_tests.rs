//! Health Check API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::TestApp;

/// Test basic health check endpoint returns 200 OK
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
}

/// Test health check returns JSON with status field
#[tokio::test]
async fn test_health_check_returns_json() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe() {
    // Liveness only says the process is up; it must not touch dependencies
    let app = TestApp::new().await;

    let response = app.get("/health/live").await;

    assert_eq!(response.status(), StatusCode::OK);
}

/// Test Prometheus metrics endpoint
#[tokio::test]
async fn test_metrics_endpoint_serves_text_format() {
    let app = TestApp::new().await;

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

/// Security headers are present on every response
#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;
    let headers = response.headers();

    assert_eq!(
        headers.get(axum::http::header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(headers.get(axum::http::header::X_FRAME_OPTIONS).unwrap(), "DENY");
}

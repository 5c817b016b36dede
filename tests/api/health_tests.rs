//! Health Check API Tests

use axum::http::StatusCode;
use serde_json::Value;
use server_settings::startup::Application;
use std::sync::Arc;

use crate::common::{sample_settings, TestApp};

/// Basic health check reports the configured run mode
#[tokio::test]
async fn test_health_check_returns_run_mode() {
    let app = TestApp::new(sample_settings());

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["run_mode"], app.settings.server.run_mode.as_str());
}

/// Liveness does not depend on backing services
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new(sample_settings());

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "alive");
}

/// Readiness fails while PostgreSQL is unreachable
#[tokio::test]
async fn test_readiness_unavailable_without_database() {
    let app = TestApp::new(sample_settings());

    let response = app.server.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
    assert_eq!(body["checks"]["redis"]["status"], "unhealthy");
}

/// The listener binds the internal port from settings
#[tokio::test]
async fn test_application_binds_internal_port() {
    let application = Application::build(Arc::new(sample_settings())).await.unwrap();

    let addr = application.local_addr().unwrap();

    assert_ne!(addr.port(), 0);
    assert!(addr.ip().is_unspecified());
}

/// Invalid ports are rejected before binding
#[tokio::test]
async fn test_application_rejects_invalid_port() {
    let mut settings = sample_settings();
    settings.server.internal_port = "not-a-port".into();

    let result = Application::build(Arc::new(settings)).await;

    assert!(result.is_err());
}

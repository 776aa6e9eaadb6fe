mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::TestApp;
use fnb_backoffice::message_queue::RedisMessageQueue;

#[tokio::test]
async fn health_reports_database_and_job_queue() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["database"], "healthy");
    assert_eq!(body["data"]["checks"]["job_queue"]["status"], "healthy");
    assert_eq!(
        body["data"]["checks"]["job_queue"]["backend"],
        app.state.config.job_queue_backend.as_str()
    );
}

#[tokio::test]
async fn unreachable_job_queue_degrades_health() {
    let client = Arc::new(redis::Client::open("redis://127.0.0.1:1/").unwrap());
    let app = TestApp::with_queue(Arc::new(RedisMessageQueue::new(client, "fnb-test"))).await;

    let (status, body) = app.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["checks"]["database"], "healthy");
    assert_eq!(body["data"]["checks"]["job_queue"]["status"], "unhealthy");
}

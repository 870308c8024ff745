//! HTTP backend against a local Axum server.

use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;

use agent_monitor::api::{AgentBackend, HttpBackend};
use agent_monitor::error::BackendError;
use agent_monitor::state::{JobStatus, LogLevel};

async fn status(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "garbled" => (StatusCode::OK, "{ not json").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "status": "running" })).into_response()
        }
        _ => Json(json!({
            "status": "running",
            "message": "Processing Lisbon",
            "progress": 42.5,
            "jobs_found": 18,
            "emails_found": 7,
            "processed_cities": 2
        }))
        .into_response(),
    }
}

async fn logs(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "quiet" => Json(json!({})).into_response(),
        "broken" => StatusCode::BAD_GATEWAY.into_response(),
        _ => Json(json!({
            "logs": [
                { "id": "1", "job_id": id, "message": "Started search", "level": "info",
                  "timestamp": "2024-05-01T10:00:00Z" },
                { "id": "2", "job_id": id, "message": "Found contact", "level": "success",
                  "timestamp": "2024-05-01T10:00:05Z", "company": "Acme", "email": "hi@acme.test" }
            ]
        }))
        .into_response(),
    }
}

/// Start an Axum server on a random port and return a backend pointing at it.
async fn start_server() -> HttpBackend {
    start_server_with_timeout(Duration::from_secs(2)).await
}

async fn start_server_with_timeout(timeout: Duration) -> HttpBackend {
    let app = Router::new()
        .route("/status/{id}", get(status))
        .route("/logs/{id}", get(logs));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpBackend::with_timeout(format!("http://127.0.0.1:{port}/"), timeout).unwrap()
}

#[tokio::test]
async fn status_is_decoded_and_tagged_with_the_job_id() {
    let backend = start_server().await;

    let snapshot = backend.fetch_status("a1").await.unwrap();
    assert_eq!(snapshot.job_id, "a1");
    assert_eq!(snapshot.status, JobStatus::Running);
    assert_eq!(snapshot.message, "Processing Lisbon");
    assert_eq!(snapshot.jobs_found, Some(18));
    assert_eq!(snapshot.processed_companies, None);
    assert_eq!(snapshot.progress_ratio(), Some(0.425));
}

#[tokio::test]
async fn logs_are_decoded_in_order() {
    let backend = start_server().await;

    let entries = backend.fetch_logs("a1").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].agent_id, "a1");
    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[1].level, LogLevel::Success);
    assert_eq!(entries[1].email.as_deref(), Some("hi@acme.test"));
}

#[tokio::test]
async fn missing_logs_field_means_no_logs() {
    let backend = start_server().await;
    assert!(backend.fetch_logs("quiet").await.unwrap().is_empty());
}

#[tokio::test]
async fn error_statuses_are_reported() {
    let backend = start_server().await;

    match backend.fetch_status("broken").await {
        Err(BackendError::Status { url, status }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/status/broken"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert!(matches!(
        backend.fetch_logs("broken").await,
        Err(BackendError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let backend = start_server().await;
    assert!(matches!(
        backend.fetch_status("garbled").await,
        Err(BackendError::Decode { .. })
    ));
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let backend = HttpBackend::with_timeout(format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();
    assert!(matches!(
        backend.fetch_status("a1").await,
        Err(BackendError::Request { .. })
    ));
}

#[tokio::test]
async fn request_timeout_is_applied() {
    let backend = start_server_with_timeout(Duration::from_millis(100)).await;
    assert!(matches!(
        backend.fetch_status("slow").await,
        Err(BackendError::Request { .. })
    ));
}

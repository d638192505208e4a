//! Client tests against a stub orchestrator served on a loopback socket.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use retire_aap::{AapClient, AapError};

async fn api_root() -> impl IntoResponse {
    ([("Api-Version", "2.0")], Json(serde_json::json!({})))
}

async fn launch(Path(template_id): Path<String>, Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    // The launch payload must be exactly {"extra_vars": {...}}.
    if !body["extra_vars"].is_object() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"detail": "missing extra_vars"})),
        );
    }
    if template_id == "403" {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"detail": "not allowed to start this template"})),
        );
    }
    (
        StatusCode::CREATED,
        Json(serde_json::json!({"id": 12345, "url": "/api/v2/jobs/12345/"})),
    )
}

async fn job_detail(Path(job_id): Path<String>) -> impl IntoResponse {
    if job_id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"detail": "Not found."})),
        );
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "successful",
            "started": "2025-07-10T20:00:00Z",
            "finished": "2025-07-10T20:05:00Z",
            "failed": 1,
            "job_template": 66,
            "extra_vars": {"record_names": ["vm1"]},
            "job_explanation": ""
        })),
    )
}

/// Serve the stub orchestrator on an ephemeral port, returning its base
/// URL.
async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/api/v2/", get(api_root))
        .route("/api/v2/job_templates/{id}/launch/", post(launch))
        .route("/api/v2/jobs/{id}/", get(job_detail));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn ping_returns_api_version() {
    let base = spawn_stub().await;
    let client = AapClient::new(base, "test-token");

    let version = client.ping().await.unwrap();
    assert_eq!(version.as_deref(), Some("2.0"));
}

#[tokio::test]
async fn launch_job_parses_id_and_url() {
    let base = spawn_stub().await;
    let client = AapClient::new(base, "test-token");

    let extra_vars = serde_json::json!({"record_names": ["vm1", "vm2"]});
    let launched = client.launch_job("66", &extra_vars).await.unwrap();

    assert_eq!(launched.id, 12345);
    assert_eq!(launched.url.as_deref(), Some("/api/v2/jobs/12345/"));
}

#[tokio::test]
async fn launch_error_carries_status_and_body() {
    let base = spawn_stub().await;
    let client = AapClient::new(base, "test-token");

    let err = client
        .launch_job("403", &serde_json::json!({}))
        .await
        .unwrap_err();

    match err {
        AapError::Api { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("not allowed"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_job_parses_timestamps_and_counts() {
    let base = spawn_stub().await;
    let client = AapClient::new(base, "test-token");

    let detail = client.get_job("12345").await.unwrap();
    assert_eq!(detail.status, "successful");
    assert!(detail.started.is_some());
    assert!(detail.finished.is_some());
    assert_eq!(detail.failed, 1);
    assert_eq!(detail.job_template, Some(66));
}

#[tokio::test]
async fn get_job_surfaces_not_found_as_api_error() {
    let base = spawn_stub().await;
    let client = AapClient::new(base, "test-token");

    let err = client.get_job("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn unreachable_orchestrator_is_a_request_error() {
    // Nothing listens on this port.
    let client = AapClient::new("http://127.0.0.1:9", "test-token");

    let err = client.get_job("1").await.unwrap_err();
    assert!(matches!(err, AapError::Request(_)));
    assert_eq!(err.status(), None);
}

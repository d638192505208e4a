use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, Response, StatusCode};
use axum::routing::{get as routing_get, post};
use axum::{Json, Router};
use base64::Engine;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower::ServiceExt;

use retire_api::config::ServerConfig;
use retire_api::engine::launcher::JobLauncher;
use retire_api::engine::monitor::JobMonitor;
use retire_api::router::build_app_router;
use retire_api::state::AppState;
use retire_api::ws::WsManager;
use retire_events::EventBus;

/// Shared state for the stub orchestrator.
///
/// `jobs` maps job id to the JSON detail served for `GET /jobs/{id}/`;
/// ids not in the map answer 500 so tests can simulate upstream failures.
/// `launch_calls` counts template launches so tests can assert that
/// validation failures never go outbound.
#[derive(Clone, Default)]
pub struct StubOrchestrator {
    pub launch_calls: Arc<AtomicUsize>,
    pub jobs: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl StubOrchestrator {
    pub async fn set_job(&self, job_id: &str, detail: serde_json::Value) {
        self.jobs.lock().await.insert(job_id.to_string(), detail);
    }
}

async fn stub_ping() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Api-Version", "2.4")
        .body(Body::from("{}"))
        .unwrap()
}

async fn stub_launch(State(stub): State<StubOrchestrator>) -> (StatusCode, Json<serde_json::Value>) {
    stub.launch_calls
        .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": 12345,
            "url": "/api/v2/jobs/12345/",
        })),
    )
}

async fn stub_get_job(
    State(stub): State<StubOrchestrator>,
    Path(job_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match stub.jobs.lock().await.get(&job_id) {
        Some(detail) => (StatusCode::OK, Json(detail.clone())),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "stub has no such job"})),
        ),
    }
}

/// Start the stub orchestrator on an ephemeral port.
///
/// Returns its base URL; the server lives until the test process exits.
pub async fn spawn_stub(stub: StubOrchestrator) -> String {
    let router = Router::new()
        .route("/api/v2/", routing_get(stub_ping))
        .route("/api/v2/job_templates/{id}/launch/", post(stub_launch))
        .route("/api/v2/jobs/{id}/", routing_get(stub_get_job))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{addr}")
}

/// Build a test `ServerConfig` pointing at the stub orchestrator.
pub fn test_config(stub_base: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "sqlite::memory:".to_string(),
        aap_url: stub_base.to_string(),
        aap_token: "test-token".to_string(),
        aap_template_id: "66".to_string(),
        auth_username: "admin".to_string(),
        auth_password: "password".to_string(),
        dns_server_default: "dns1.example.internal".to_string(),
        dns_zone_default: "example.internal".to_string(),
        poll_interval_secs: 30,
        poll_window_hours: 48,
    }
}

/// Build the shared application state wired to the stub orchestrator.
pub fn test_state(pool: SqlitePool, stub_base: &str) -> AppState {
    let config = test_config(stub_base);
    let ws_manager = Arc::new(WsManager::new());
    let event_bus = Arc::new(EventBus::default());
    let aap = Arc::new(retire_aap::AapClient::new(
        &config.aap_url,
        &config.aap_token,
    ));

    let launcher = Arc::new(JobLauncher::new(
        Arc::clone(&aap),
        pool.clone(),
        event_bus.clone() as Arc<dyn retire_events::Notifier>,
        config.aap_template_id.clone(),
        config.dns_server_default.clone(),
        config.dns_zone_default.clone(),
    ));
    let monitor = Arc::new(JobMonitor::new(Arc::clone(&aap), pool.clone()));

    AppState {
        pool,
        config: Arc::new(config),
        ws_manager,
        event_bus,
        aap,
        launcher,
        monitor,
    }
}

/// Build the full application router against the stub orchestrator.
///
/// Mirrors `main.rs` so integration tests exercise the same middleware
/// stack (CORS, request ID, timeout, panic recovery) that production uses.
pub fn build_test_app(pool: SqlitePool, stub_base: &str) -> Router {
    let state = test_state(pool, stub_base);
    let config = state.config.clone();
    build_app_router(state, &config)
}

/// `Authorization` header value for the test operator credentials.
pub fn basic_auth() -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode("admin:password");
    format!("Basic {encoded}")
}

/// Send an unauthenticated GET request.
pub async fn get_unauth(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("send request")
}

/// Send an authenticated GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("send request")
}

/// Send an authenticated POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    app.oneshot(request).await.expect("send request")
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse body as JSON")
}

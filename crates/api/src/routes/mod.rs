pub mod dashboard;
pub mod health;
pub mod jobs;
pub mod orchestrator;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                      WebSocket (live job + dashboard updates)
///
/// /jobs                    list, launch (GET, POST)
/// /jobs/{id}               get job + history (GET)
/// /jobs/{id}/monitor       force refresh from the orchestrator (POST)
///
/// /dashboard               aggregate operator view (GET)
///
/// /orchestrator/ping       orchestrator connectivity probe (GET)
/// /status                  application status echo (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Job launch, listing, and monitoring.
        .nest("/jobs", jobs::router())
        // Dashboard aggregation.
        .nest("/dashboard", dashboard::router())
        // Orchestrator probe.
        .nest("/orchestrator", orchestrator::router())
        // Application status echo.
        .route("/status", get(handlers::orchestrator::app_status))
}

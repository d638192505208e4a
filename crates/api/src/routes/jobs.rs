//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require HTTP Basic authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                -> list_jobs
/// POST   /                -> launch_job
/// GET    /{id}            -> get_job
/// POST   /{id}/monitor    -> monitor_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::launch_job))
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/monitor", post(jobs::monitor_job))
}

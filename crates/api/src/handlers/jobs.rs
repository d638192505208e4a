//! Handlers for the `/jobs` resource.
//!
//! All endpoints require HTTP Basic authentication via [`AuthOperator`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use retire_core::error::CoreError;
use retire_db::models::dashboard::summarize;
use retire_db::models::job::{JobListQuery, JobRecord};
use retire_db::repositories::JobRepo;
use retire_events::{JobEvent, EVENT_JOB_UPDATE};

use crate::engine::launcher::BatchSubmission;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default query window when the caller does not specify `hours`.
const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Fetch a job by id or return a 404.
async fn find_or_404(pool: &retire_db::DbPool, job_id: &str) -> AppResult<JobRecord> {
    JobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id.to_string(),
        }))
}

// ---------------------------------------------------------------------------
// Launch
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Validate a batch submission and launch it on the orchestrator.
/// Returns 201 with the orchestrator-assigned job id. Validation
/// failures return 400 before any outbound call; orchestrator failures
/// return 502.
pub async fn launch_job(
    auth: AuthOperator,
    State(state): State<AppState>,
    Json(submission): Json<BatchSubmission>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.launcher.launch(submission).await?;

    tracing::info!(
        job_id = %outcome.job_id,
        operator = %auth.username,
        "Batch job launched",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// List jobs inside a recency window, newest first. Supports optional
/// `hours` (default 24) and `status` query parameters. The response
/// carries the matching records plus aggregate counters over them.
pub async fn list_jobs(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let hours = params.hours.unwrap_or(DEFAULT_WINDOW_HOURS);
    let jobs = JobRepo::list_recent(&state.pool, hours, params.status).await?;
    let summary = summarize(&jobs, hours);
    let total_count = jobs.len();

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "jobs": jobs,
            "summary": summary,
            "total_count": total_count,
        }),
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}
///
/// Get a single job with its full status history. When the stored status
/// is still active, a live refresh is attempted first so the caller sees
/// current state; a failed refresh is logged and the stored record is
/// served as-is.
pub async fn get_job(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut record = find_or_404(&state.pool, &job_id).await?;

    if record.status.is_active() {
        let refreshed = state
            .monitor
            .refresh(&job_id, &record.target_hosts.0, &record.job_kind)
            .await;
        match refreshed {
            Ok(refreshed) => record = refreshed,
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "Live refresh failed, serving stored record");
                record = find_or_404(&state.pool, &job_id).await?;
            }
        }
    }

    let history = JobRepo::history(&state.pool, &job_id).await?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "job": record,
            "history": history,
        }),
    }))
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/monitor
///
/// Force a synchronous refresh of one job from the orchestrator.
/// Returns the updated record and pushes a `job_update` event to
/// connected viewers. An unreachable orchestrator returns 502 after the
/// error state has been recorded.
pub async fn monitor_job(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = find_or_404(&state.pool, &job_id).await?;

    let updated = state
        .monitor
        .refresh(&job_id, &record.target_hosts.0, &record.job_kind)
        .await?;

    state.event_bus.publish(
        JobEvent::new(EVENT_JOB_UPDATE)
            .with_job(&job_id)
            .with_payload(serde_json::json!({
                "job_id": updated.job_id,
                "status": updated.status,
                "duration_seconds": updated.duration_seconds,
                "success_rate": updated.success_rate,
                "errors": updated.errors,
                "target_hosts": updated.target_hosts.0,
            })),
    );

    Ok(Json(DataResponse { data: updated }))
}

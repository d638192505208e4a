//! Dashboard aggregation handler.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use retire_db::models::dashboard::summarize;
use retire_db::repositories::JobRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default recency window for the dashboard view.
const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Most recent jobs included verbatim in the dashboard payload.
const RECENT_JOBS_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub hours: Option<i64>,
}

/// GET /api/v1/dashboard
///
/// One-call aggregate view for the operator console: summary counters,
/// the most recent jobs (capped), the currently active jobs, and the
/// headline statistics the frontend charts.
pub async fn get_dashboard(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<impl IntoResponse> {
    let hours = params.hours.unwrap_or(DEFAULT_WINDOW_HOURS);

    let recent = JobRepo::list_recent(&state.pool, hours, None).await?;
    let summary = summarize(&recent, hours);

    let active: Vec<_> = recent.iter().filter(|j| j.status.is_active()).collect();
    let recent_capped: Vec<_> = recent.iter().take(RECENT_JOBS_LIMIT).collect();
    let total_active = active.len();

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "summary": summary,
            "recent_jobs": recent_capped,
            "active_jobs": active,
            "statistics": {
                "total_active": total_active,
                "success_rate_24h": summary.success_rate,
                "avg_duration_minutes": summary.average_duration_minutes,
                "jobs_per_hour": summary.jobs_per_hour,
            },
            "timestamp": Utc::now(),
        }),
    }))
}

//! Orchestrator connectivity probe and application status echo.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::engine::upstream_error;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/orchestrator/ping
///
/// Round-trip connectivity check against the orchestrator API root.
/// Returns the advertised API version; an unreachable orchestrator
/// returns 502 with a templated message.
pub async fn ping_orchestrator(
    _auth: AuthOperator,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let version = state
        .aap
        .ping()
        .await
        .map_err(|e| AppError::Core(upstream_error(e)))?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "status": "ok",
            "api_version": version,
            "timestamp": Utc::now(),
        }),
    }))
}

/// GET /api/v1/status
///
/// Application configuration echo for the console's settings panel.
/// Secrets are reported by presence only, never by value.
pub async fn app_status(
    _auth: AuthOperator,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let db_healthy = retire_db::health_check(&state.pool).await.is_ok();

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "db_healthy": db_healthy,
            "orchestrator_url": state.config.aap_url,
            "orchestrator_token_configured": !state.config.aap_token.is_empty(),
            "template_id": state.config.aap_template_id,
            "poll_interval_secs": state.config.poll_interval_secs,
            "ws_connections": state.ws_manager.connection_count().await,
        }),
    }))
}

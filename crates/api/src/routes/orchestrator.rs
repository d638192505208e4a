use axum::routing::get;
use axum::Router;

use crate::handlers::orchestrator;
use crate::state::AppState;

/// Routes mounted at `/orchestrator`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ping", get(orchestrator::ping_orchestrator))
}

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::launcher::JobLauncher;
use crate::engine::monitor::JobMonitor;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or already `Clone`). The
/// launcher and monitor are constructed once in `main` and injected here
/// rather than materialized lazily by handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: retire_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for publishing job events.
    pub event_bus: Arc<retire_events::EventBus>,
    /// Orchestrator REST client.
    pub aap: Arc<retire_aap::AapClient>,
    /// Validates submissions and forwards them to the orchestrator.
    pub launcher: Arc<JobLauncher>,
    /// Refreshes job state from the orchestrator.
    pub monitor: Arc<JobMonitor>,
}

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use retire_db::models::dashboard::summarize;
use retire_db::repositories::JobRepo;
use retire_events::{EVENT_DASHBOARD_UPDATE, EVENT_JOB_UPDATE};
use serde::Deserialize;

use crate::middleware::auth::AuthOperator;
use crate::state::AppState;

/// Window for on-demand dashboard snapshots requested over the socket.
const DASHBOARD_WINDOW_HOURS: i64 = 24;

/// Messages a browser client may send after connecting.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientMessage {
    /// Narrow this connection to a set of job ids. An empty list resets
    /// the connection to follow everything.
    SubscribeJobUpdates { job_ids: Vec<String> },
    /// Request an immediate dashboard snapshot.
    GetDashboardUpdate,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager` and
/// managed by two tasks (sender + receiver).
pub async fn ws_handler(
    _auth: AuthOperator,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound messages on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = state.ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => dispatch(&state, &conn_id, msg).await,
                    Err(e) => {
                        tracing::debug!(conn_id = %conn_id, error = %e, "Unrecognized WebSocket message");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Handle a parsed client message.
async fn dispatch(state: &AppState, conn_id: &str, msg: ClientMessage) {
    match msg {
        ClientMessage::SubscribeJobUpdates { job_ids } => {
            tracing::debug!(conn_id = %conn_id, count = job_ids.len(), "Subscription updated");
            state
                .ws_manager
                .set_subscriptions(conn_id, job_ids.iter().cloned().collect())
                .await;

            // Immediately push the current status of each requested job so
            // the client does not have to wait for the next poll cycle.
            for job_id in &job_ids {
                match JobRepo::find_by_id(&state.pool, job_id).await {
                    Ok(Some(job)) => {
                        let snapshot = serde_json::json!({
                            "event": EVENT_JOB_UPDATE,
                            "job_id": job.job_id,
                            "payload": {
                                "job_id": job.job_id,
                                "status": job.status,
                                "duration_seconds": job.duration_seconds,
                                "success_rate": job.success_rate,
                                "errors": job.errors,
                                "target_hosts": job.target_hosts.0,
                            },
                            "timestamp": Utc::now(),
                        });
                        state
                            .ws_manager
                            .send_to(conn_id, Message::Text(snapshot.to_string().into()))
                            .await;
                    }
                    Ok(None) => {
                        tracing::debug!(conn_id = %conn_id, job_id = %job_id, "Subscribed to unknown job");
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to load job snapshot");
                    }
                }
            }
        }
        ClientMessage::GetDashboardUpdate => {
            send_dashboard_snapshot(state, conn_id).await;
        }
    }
}

/// Build and send a dashboard snapshot to one connection.
async fn send_dashboard_snapshot(state: &AppState, conn_id: &str) {
    let recent = match JobRepo::list_recent(&state.pool, DASHBOARD_WINDOW_HOURS, None).await {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load jobs for dashboard snapshot");
            return;
        }
    };
    let active: Vec<_> = recent.iter().filter(|j| j.status.is_active()).collect();
    let summary = summarize(&recent, DASHBOARD_WINDOW_HOURS);

    let snapshot = serde_json::json!({
        "event": EVENT_DASHBOARD_UPDATE,
        "payload": {
            "summary": summary,
            "active_jobs": active,
            "timestamp": Utc::now(),
        },
        "timestamp": Utc::now(),
    });
    state
        .ws_manager
        .send_to(conn_id, Message::Text(snapshot.to_string().into()))
        .await;
}

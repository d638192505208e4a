//! Event-to-WebSocket routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and forwards each
//! event to the connected browser clients, respecting per-connection job
//! subscriptions.

use std::sync::Arc;

use axum::extract::ws::Message;
use retire_events::JobEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Routes job events to WebSocket clients.
///
/// Consumes events from the broadcast channel and delivers each one as a
/// JSON text frame. Events carrying a job id go only to connections
/// following that job; aggregate events go to everyone.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    /// Create a new router with the given WebSocket manager.
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](retire_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<JobEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver a single event to the interested connections.
    async fn route_event(&self, event: &JobEvent) {
        let body = match serde_json::to_string(event) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, event = %event.event, "Failed to serialize event");
                return;
            }
        };
        let msg = Message::Text(body.into());

        match event.job_id.as_deref() {
            Some(job_id) => {
                let delivered = self.ws_manager.send_to_job_subscribers(job_id, msg).await;
                tracing::debug!(
                    event = %event.event,
                    job_id = %job_id,
                    delivered,
                    "Routed job event"
                );
            }
            None => {
                self.ws_manager.broadcast(msg).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use retire_events::{EventBus, JobEvent, EVENT_DASHBOARD_STATS_UPDATE, EVENT_JOB_UPDATE};

    use super::*;

    #[tokio::test]
    async fn job_events_reach_only_subscribed_connections() {
        let manager = Arc::new(WsManager::new());
        let mut follows_42 = manager.add("a".into()).await;
        let mut follows_7 = manager.add("b".into()).await;
        manager
            .set_subscriptions("a", HashSet::from(["42".to_string()]))
            .await;
        manager
            .set_subscriptions("b", HashSet::from(["7".to_string()]))
            .await;

        let bus = EventBus::default();
        let receiver = bus.subscribe();
        let router = NotificationRouter::new(manager.clone());
        let handle = tokio::spawn(router.run(receiver));

        bus.publish(
            JobEvent::new(EVENT_JOB_UPDATE)
                .with_job("42")
                .with_payload(serde_json::json!({"status": "running"})),
        );

        let msg = follows_42.recv().await.expect("subscriber should receive");
        match msg {
            Message::Text(text) => {
                let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(parsed["event"], EVENT_JOB_UPDATE);
                assert_eq!(parsed["job_id"], "42");
                assert_eq!(parsed["payload"]["status"], "running");
            }
            other => panic!("expected text frame, got {other:?}"),
        }
        assert!(follows_7.try_recv().is_err());

        drop(bus);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn aggregate_events_are_broadcast() {
        let manager = Arc::new(WsManager::new());
        let mut rx1 = manager.add("a".into()).await;
        let mut rx2 = manager.add("b".into()).await;
        manager
            .set_subscriptions("b", HashSet::from(["99".to_string()]))
            .await;

        let bus = EventBus::default();
        let receiver = bus.subscribe();
        let handle = tokio::spawn(NotificationRouter::new(manager.clone()).run(receiver));

        bus.publish(
            JobEvent::new(EVENT_DASHBOARD_STATS_UPDATE)
                .with_payload(serde_json::json!({"total_active": 3})),
        );

        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());

        drop(bus);
        handle.await.unwrap();
    }
}

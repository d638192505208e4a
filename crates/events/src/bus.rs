//! In-process event bus backed by a `tokio::sync::broadcast` channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A job transitioned into the store for the first time.
pub const EVENT_JOB_STARTED: &str = "job_started";
/// A job's canonical status or derived fields changed.
pub const EVENT_JOB_UPDATE: &str = "job_update";
/// On-demand dashboard snapshot requested by a viewer.
pub const EVENT_DASHBOARD_UPDATE: &str = "dashboard_update";
/// End-of-cycle aggregate statistics from the background poller.
pub const EVENT_DASHBOARD_STATS_UPDATE: &str = "dashboard_stats_update";

/// Event envelope pushed to connected viewers.
///
/// Constructed via [`JobEvent::new`] and enriched with
/// [`with_job`](JobEvent::with_job) and
/// [`with_payload`](JobEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// Event name, e.g. `"job_update"`.
    pub event: String,

    /// The job this event concerns; `None` for aggregate events.
    pub job_id: Option<String>,

    /// Flat JSON payload, shaped per event type.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    /// Create a new event with only the required name.
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            job_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the job this event concerns.
    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Outward push capability: fire-and-forget, no delivery guarantee, no
/// back-pressure.
///
/// The launcher and the background poller depend on this trait rather
/// than on a concrete transport.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: JobEvent);
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`JobEvent`]. Designed to be
/// shared via `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is dropped; a
    /// SendError only means there are zero receivers.
    pub fn publish(&self, event: JobEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::debug!(event = %e.0.event, "Event dropped, no active subscribers");
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Notifier for EventBus {
    fn notify(&self, event: JobEvent) {
        self.publish(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

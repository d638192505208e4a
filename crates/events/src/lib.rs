//! Job event bus and the outward notification capability.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`JobEvent`] -- the event envelope pushed to dashboard viewers.
//! - [`Notifier`] -- fire-and-forget capability injected into the launcher
//!   and the background poller; the bus is the in-process implementation,
//!   the WebSocket notification router is the transport on the far side.

pub mod bus;

pub use bus::{
    EventBus, JobEvent, Notifier, EVENT_DASHBOARD_STATS_UPDATE, EVENT_DASHBOARD_UPDATE,
    EVENT_JOB_STARTED, EVENT_JOB_UPDATE,
};

//! Fan-out of bus events to connected WebSocket clients.

pub mod router;

pub use router::NotificationRouter;

//! HTTP request handlers, grouped by resource.

pub mod dashboard;
pub mod jobs;
pub mod orchestrator;

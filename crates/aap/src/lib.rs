//! REST client for the automation orchestrator's job API.
//!
//! Wraps the three endpoints this system consumes (connectivity probe,
//! job-template launch, job status query) using [`reqwest`], with typed
//! responses and explicit per-request timeouts.

pub mod client;

pub use client::{AapClient, AapError, JobDetail, LaunchResponse};

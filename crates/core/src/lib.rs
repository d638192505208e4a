//! Shared types and the domain error taxonomy for the retirement gateway.

pub mod error;
pub mod types;

pub use error::CoreError;

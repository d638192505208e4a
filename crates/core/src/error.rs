#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The orchestrator was unreachable, timed out, or answered with an
    /// error status. The message is already sanitized for logging; it must
    /// never contain credentials.
    #[error("Upstream error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// A local store write failed after the orchestrator already accepted
    /// the work. Logged, never surfaced to the submission caller.
    #[error("Recording failure: {0}")]
    Recording(String),
}

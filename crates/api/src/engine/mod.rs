//! Job launch and monitoring engine.
//!
//! [`launcher::JobLauncher`] validates submissions and forwards them to
//! the orchestrator; [`monitor::JobMonitor`] refreshes live job state and
//! records every observation. Both are constructed in `main` and injected
//! through [`AppState`](crate::state::AppState).

pub mod launcher;
pub mod monitor;

use retire_aap::AapError;
use retire_core::error::CoreError;

/// Translate an orchestrator client error into the domain taxonomy.
///
/// The outward message is templated; the raw response body stays in the
/// logs only (the client already truncates and logs it).
pub(crate) fn upstream_error(err: AapError) -> CoreError {
    let status = err.status();
    let message = if err.is_timeout() {
        "orchestrator request timed out".to_string()
    } else {
        match status {
            Some(code) => format!("orchestrator returned status {code}"),
            None => "orchestrator unreachable".to_string(),
        }
    };
    CoreError::Upstream { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status_in_template() {
        let err = AapError::Api {
            status: 403,
            body: "secret-token-material".into(),
        };
        let core = upstream_error(err);
        match core {
            CoreError::Upstream { status, message } => {
                assert_eq!(status, Some(403));
                assert_eq!(message, "orchestrator returned status 403");
                // The response body must not leak into the message.
                assert!(!message.contains("secret"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }
}

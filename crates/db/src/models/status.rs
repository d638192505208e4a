//! Canonical job status vocabulary and the orchestrator status mapper.
//!
//! Statuses are stored as lowercase TEXT in the `job_records` table; the
//! serde and sqlx representations must stay in sync.

use serde::{Deserialize, Serialize};

/// Canonical job status, independent of the orchestrator's native
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Successful,
    Failed,
    /// The monitor could not reach the orchestrator; the real state is
    /// unobservable. Distinct from `Failed` (the orchestrator reported
    /// a failed run).
    Error,
    Unknown,
}

impl JobStatus {
    /// Map an orchestrator-native status string to the canonical enum.
    ///
    /// Total and case-insensitive; anything unrecognized maps to
    /// [`JobStatus::Unknown`].
    pub fn from_orchestrator(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "waiting" | "never updated" => Self::Pending,
            "running" => Self::Running,
            "successful" => Self::Successful,
            "failed" | "error" | "canceled" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Terminal states: no further transitions expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }

    /// States the background poller keeps refreshing.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// Decide the status to store given what is already recorded.
///
/// A stored terminal state is never regressed to a non-terminal state by a
/// monitor refresh; a terminal-to-terminal change reported by the
/// orchestrator is applied as-is.
pub fn resolve_status(existing: Option<JobStatus>, incoming: JobStatus) -> JobStatus {
    match existing {
        Some(current) if current.is_terminal() && !incoming.is_terminal() => current,
        _ => incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_orchestrator_vocabulary() {
        assert_eq!(JobStatus::from_orchestrator("pending"), JobStatus::Pending);
        assert_eq!(JobStatus::from_orchestrator("waiting"), JobStatus::Pending);
        assert_eq!(
            JobStatus::from_orchestrator("never updated"),
            JobStatus::Pending
        );
        assert_eq!(JobStatus::from_orchestrator("running"), JobStatus::Running);
        assert_eq!(
            JobStatus::from_orchestrator("successful"),
            JobStatus::Successful
        );
        assert_eq!(JobStatus::from_orchestrator("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_orchestrator("error"), JobStatus::Failed);
        assert_eq!(JobStatus::from_orchestrator("canceled"), JobStatus::Failed);
    }

    #[test]
    fn mapping_is_case_insensitive() {
        assert_eq!(JobStatus::from_orchestrator("RUNNING"), JobStatus::Running);
        assert_eq!(
            JobStatus::from_orchestrator("Successful"),
            JobStatus::Successful
        );
        assert_eq!(
            JobStatus::from_orchestrator("  Never Updated "),
            JobStatus::Pending
        );
    }

    #[test]
    fn unrecognized_input_maps_to_unknown() {
        assert_eq!(JobStatus::from_orchestrator("bogus"), JobStatus::Unknown);
        assert_eq!(JobStatus::from_orchestrator(""), JobStatus::Unknown);
    }

    #[test]
    fn terminal_state_is_not_regressed() {
        assert_eq!(
            resolve_status(Some(JobStatus::Successful), JobStatus::Pending),
            JobStatus::Successful
        );
        assert_eq!(
            resolve_status(Some(JobStatus::Failed), JobStatus::Running),
            JobStatus::Failed
        );
        // Monitor errors do not overwrite a terminal result either.
        assert_eq!(
            resolve_status(Some(JobStatus::Successful), JobStatus::Error),
            JobStatus::Successful
        );
    }

    #[test]
    fn terminal_to_terminal_change_is_applied() {
        assert_eq!(
            resolve_status(Some(JobStatus::Successful), JobStatus::Failed),
            JobStatus::Failed
        );
    }

    #[test]
    fn non_terminal_states_always_update() {
        assert_eq!(
            resolve_status(Some(JobStatus::Pending), JobStatus::Running),
            JobStatus::Running
        );
        assert_eq!(
            resolve_status(None, JobStatus::Pending),
            JobStatus::Pending
        );
    }
}

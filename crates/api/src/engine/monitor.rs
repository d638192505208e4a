//! Live job state refresh against the orchestrator.

use std::sync::Arc;

use chrono::Utc;
use retire_aap::JobDetail;
use retire_core::error::CoreError;
use retire_core::types::Timestamp;
use retire_db::models::job::{JobObservation, JobRecord};
use retire_db::models::status::JobStatus;
use retire_db::repositories::JobRepo;
use retire_db::DbPool;

use super::upstream_error;

/// Generic error string recorded when the orchestrator's stdout carries a
/// failure marker but no structured explanation.
const STDOUT_FAILURE_HINT: &str =
    "Job execution failed - check orchestrator logs for details";

/// Queries the orchestrator for a job's live state and records every
/// observation, success or failure, as one upsert plus one history entry.
pub struct JobMonitor {
    aap: Arc<retire_aap::AapClient>,
    pool: DbPool,
}

impl JobMonitor {
    pub fn new(aap: Arc<retire_aap::AapClient>, pool: DbPool) -> Self {
        Self { aap, pool }
    }

    /// Refresh one job from the orchestrator.
    ///
    /// On success the canonical status, duration, success rate, and error
    /// extracts are recorded and the updated record returned. On an
    /// upstream failure a `status=error` observation with a non-empty
    /// `errors` list is recorded first, then the upstream error is
    /// returned, so callers see a signal rather than a silent gap.
    pub async fn refresh(
        &self,
        job_id: &str,
        target_hosts: &[String],
        job_kind: &str,
    ) -> Result<JobRecord, CoreError> {
        let existing = JobRepo::find_by_id(&self.pool, job_id)
            .await
            .map_err(|e| CoreError::Recording(e.to_string()))?;

        match self.aap.get_job(job_id).await {
            Ok(detail) => {
                let observation =
                    build_observation(job_id, target_hosts, job_kind, &detail, existing.as_ref());
                let details = format!("Job {}", observation.status.as_str());
                JobRepo::upsert_with_history(&self.pool, &observation, &details)
                    .await
                    .map_err(|e| CoreError::Recording(e.to_string()))
            }
            Err(err) => {
                let upstream = upstream_error(err);
                tracing::error!(%job_id, error = %upstream, "Job status query failed");

                // Record the failed probe so the dashboard shows a
                // terminal-ish signal instead of a stale status.
                let observation = error_observation(
                    job_id,
                    target_hosts,
                    job_kind,
                    &upstream.to_string(),
                    existing.as_ref(),
                );
                let details = format!("Monitoring error: {upstream}");
                if let Err(e) =
                    JobRepo::upsert_with_history(&self.pool, &observation, &details).await
                {
                    tracing::error!(%job_id, error = %e, "Failed to record monitoring error");
                }

                Err(upstream)
            }
        }
    }
}

/// Turn an orchestrator job detail into the observation to store.
fn build_observation(
    job_id: &str,
    target_hosts: &[String],
    job_kind: &str,
    detail: &JobDetail,
    existing: Option<&JobRecord>,
) -> JobObservation {
    let status = JobStatus::from_orchestrator(&detail.status);
    let duration_seconds = compute_duration(job_id, detail.started, detail.finished);
    let success_rate = compute_success_rate(target_hosts.len(), detail.failed as usize);

    JobObservation {
        job_id: job_id.to_string(),
        status,
        job_kind: job_kind.to_string(),
        target_hosts: target_hosts.to_vec(),
        start_time: detail
            .started
            .or(existing.map(|r| r.start_time))
            .unwrap_or_else(Utc::now),
        end_time: detail.finished,
        duration_seconds,
        success_rate,
        errors: extract_errors(detail),
        template_id: detail
            .job_template
            .map(|t| t.to_string())
            .or_else(|| existing.and_then(|r| r.template_id.clone())),
        extra_vars: detail
            .extra_vars
            .clone()
            .or_else(|| existing.map(|r| r.extra_vars.0.clone()))
            .unwrap_or_else(|| serde_json::json!({})),
    }
}

/// Observation recorded when the orchestrator could not be queried.
/// Fields the probe cannot supply are carried over from the stored
/// record.
fn error_observation(
    job_id: &str,
    target_hosts: &[String],
    job_kind: &str,
    message: &str,
    existing: Option<&JobRecord>,
) -> JobObservation {
    JobObservation {
        job_id: job_id.to_string(),
        status: JobStatus::Error,
        job_kind: job_kind.to_string(),
        target_hosts: target_hosts.to_vec(),
        start_time: existing.map(|r| r.start_time).unwrap_or_else(Utc::now),
        end_time: existing.and_then(|r| r.end_time),
        duration_seconds: existing.and_then(|r| r.duration_seconds),
        success_rate: existing.map(|r| r.success_rate).unwrap_or(0.0),
        errors: Some(vec![format!("Monitoring error: {message}")]),
        template_id: existing.and_then(|r| r.template_id.clone()),
        extra_vars: existing
            .map(|r| r.extra_vars.0.clone())
            .unwrap_or_else(|| serde_json::json!({})),
    }
}

/// Seconds between start and finish; `None` when either is missing or the
/// timestamps are inconsistent (finish before start).
fn compute_duration(
    job_id: &str,
    started: Option<Timestamp>,
    finished: Option<Timestamp>,
) -> Option<f64> {
    let (started, finished) = (started?, finished?);
    if finished < started {
        tracing::warn!(
            %job_id,
            %started,
            %finished,
            "Orchestrator reported finish before start; duration withheld",
        );
        return None;
    }
    Some((finished - started).num_milliseconds() as f64 / 1000.0)
}

/// `(total - failed) / total * 100`, clamped to a zero-host batch.
fn compute_success_rate(total_hosts: usize, failed_hosts: usize) -> f64 {
    if total_hosts == 0 {
        return 0.0;
    }
    let succeeded = total_hosts.saturating_sub(failed_hosts);
    succeeded as f64 / total_hosts as f64 * 100.0
}

/// Extract at most a few human-readable error strings from a job detail.
fn extract_errors(detail: &JobDetail) -> Option<Vec<String>> {
    let raw = detail.status.trim().to_ascii_lowercase();
    if raw != "failed" && raw != "error" {
        return None;
    }

    let mut errors = Vec::new();

    if let Some(stdout) = &detail.result_stdout {
        if stdout.contains("FAILED") || stdout.contains("ERROR") {
            errors.push(STDOUT_FAILURE_HINT.to_string());
        }
    }

    if let Some(explanation) = &detail.job_explanation {
        if !explanation.is_empty() {
            errors.push(explanation.clone());
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

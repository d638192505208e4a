//! Batch submission validation and job launch.

use std::sync::Arc;

use chrono::Utc;
use retire_core::error::CoreError;
use retire_db::models::job::JobObservation;
use retire_db::models::status::JobStatus;
use retire_db::repositories::JobRepo;
use retire_db::DbPool;
use retire_events::{JobEvent, Notifier, EVENT_JOB_STARTED};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use super::upstream_error;

/// Job kind recorded for every batch launched through this gateway.
pub const JOB_KIND_RETIREMENT: &str = "retirement";

/// A batch retirement request as submitted by the operator console.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchSubmission {
    /// 1-5 VM hostnames retired together as one orchestrator job.
    #[validate(length(
        min = 1,
        max = 5,
        message = "Between 1 and 5 VM record names must be provided per job"
    ))]
    pub record_names: Vec<String>,
    #[validate(length(min = 1, message = "schedule_shutdown_date is required"))]
    pub schedule_shutdown_date: String,
    #[validate(length(min = 1, message = "schedule_shutdown_time is required"))]
    pub schedule_shutdown_time: String,
    #[validate(length(min = 1, message = "schedule_retire_date is required"))]
    pub schedule_retire_date: String,
    #[validate(length(min = 1, message = "schedule_retire_time is required"))]
    pub schedule_retire_time: String,
    /// DNS overrides; configured defaults apply when omitted.
    #[serde(default)]
    pub dns_server: Option<String>,
    #[serde(default)]
    pub dns_zone: Option<String>,
}

/// What the caller gets back from a successful launch.
#[derive(Debug, Serialize)]
pub struct LaunchOutcome {
    pub job_id: String,
    pub job_url: Option<String>,
}

/// Validates a submission, launches the orchestrator job template, and
/// records the initial job state.
pub struct JobLauncher {
    aap: Arc<retire_aap::AapClient>,
    pool: DbPool,
    notifier: Arc<dyn Notifier>,
    template_id: String,
    dns_server_default: String,
    dns_zone_default: String,
}

impl JobLauncher {
    pub fn new(
        aap: Arc<retire_aap::AapClient>,
        pool: DbPool,
        notifier: Arc<dyn Notifier>,
        template_id: String,
        dns_server_default: String,
        dns_zone_default: String,
    ) -> Self {
        Self {
            aap,
            pool,
            notifier,
            template_id,
            dns_server_default,
            dns_zone_default,
        }
    }

    /// Launch a batch retirement job.
    ///
    /// Validation failures short-circuit before any outbound call. An
    /// orchestrator failure creates no record. Once the orchestrator has
    /// accepted the job, recording and notification are best-effort: a
    /// store failure is logged and the launch still succeeds.
    pub async fn launch(&self, submission: BatchSubmission) -> Result<LaunchOutcome, CoreError> {
        submission
            .validate()
            .map_err(|e| CoreError::Validation(flatten_errors(&e)))?;

        let extra_vars = build_extra_vars(
            &submission,
            &self.dns_server_default,
            &self.dns_zone_default,
        );

        let launched = self
            .aap
            .launch_job(&self.template_id, &extra_vars)
            .await
            .map_err(upstream_error)?;

        let job_id = launched.id.to_string();
        tracing::info!(
            %job_id,
            hosts = submission.record_names.len(),
            template_id = %self.template_id,
            "Orchestrator accepted batch job",
        );

        self.record_launch(&job_id, &submission, extra_vars).await;

        Ok(LaunchOutcome {
            job_id,
            job_url: launched.url,
        })
    }

    /// Best-effort initial record plus `job_started` broadcast.
    async fn record_launch(
        &self,
        job_id: &str,
        submission: &BatchSubmission,
        extra_vars: serde_json::Value,
    ) {
        let observation = JobObservation {
            job_id: job_id.to_string(),
            status: JobStatus::Pending,
            job_kind: JOB_KIND_RETIREMENT.to_string(),
            target_hosts: submission.record_names.clone(),
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
            success_rate: 0.0,
            errors: None,
            template_id: Some(self.template_id.clone()),
            extra_vars,
        };

        match JobRepo::upsert_with_history(&self.pool, &observation, "Job pending").await {
            Ok(record) => {
                self.notifier.notify(
                    JobEvent::new(EVENT_JOB_STARTED)
                        .with_job(job_id)
                        .with_payload(serde_json::json!({
                            "job_id": job_id,
                            "status": record.status,
                            "target_hosts": record.target_hosts.0,
                            "job_kind": record.job_kind,
                        })),
                );
            }
            Err(e) => {
                // The orchestrator already accepted the job; surfacing
                // this to the caller would be wrong.
                tracing::error!(%job_id, error = %e, "Failed to record launched job");
            }
        }
    }
}

/// Build the fixed-shape parameter bundle sent to the orchestrator.
pub fn build_extra_vars(
    submission: &BatchSubmission,
    dns_server_default: &str,
    dns_zone_default: &str,
) -> serde_json::Value {
    serde_json::json!({
        "record_names": submission.record_names,
        "schedule_shutdown_date": submission.schedule_shutdown_date,
        "schedule_shutdown_time": submission.schedule_shutdown_time,
        "schedule_retire_date": submission.schedule_retire_date,
        "schedule_retire_time": submission.schedule_retire_time,
        "dns_server": submission.dns_server.as_deref().unwrap_or(dns_server_default),
        "dns_zone": submission.dns_zone.as_deref().unwrap_or(dns_zone_default),
    })
}

/// Collapse validator output into one operator-readable message.
fn flatten_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = Vec::new();
    for (field, errs) in errors.field_errors() {
        for err in errs.iter() {
            match &err.message {
                Some(msg) => messages.push(msg.to_string()),
                None => messages.push(format!("invalid value for {field}")),
            }
        }
    }
    messages.join("; ")
}

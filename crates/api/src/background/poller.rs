//! Periodic refresh of all non-terminal jobs.
//!
//! A single repeating task lists pending/running jobs inside a bounded
//! window, refreshes each through the [`JobMonitor`], and pushes change
//! notifications outward. One job failing to refresh never aborts the
//! rest of the cycle, and a failed cycle never terminates the loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use retire_db::models::dashboard::summarize;
use retire_db::repositories::JobRepo;
use retire_db::DbPool;
use retire_events::{JobEvent, Notifier, EVENT_DASHBOARD_STATS_UPDATE, EVENT_JOB_UPDATE};
use tokio_util::sync::CancellationToken;

use crate::engine::monitor::JobMonitor;

/// Window for the aggregate statistics broadcast at the end of a cycle.
const STATS_WINDOW_HOURS: i64 = 24;

/// Background polling loop over active jobs.
pub struct JobPoller {
    pool: DbPool,
    monitor: Arc<JobMonitor>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    window_hours: i64,
}

impl JobPoller {
    pub fn new(
        pool: DbPool,
        monitor: Arc<JobMonitor>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        window_hours: i64,
    ) -> Self {
        Self {
            pool,
            monitor,
            notifier,
            interval,
            window_hours,
        }
    }

    /// Run the polling loop until `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            window_hours = self.window_hours,
            "Job poller started"
        );

        let mut interval = tokio::time::interval(self.interval);
        let mut last_seen: HashSet<String> = HashSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job poller stopping");
                    break;
                }
                _ = interval.tick() => {
                    // The loop must survive any single bad iteration.
                    if let Err(e) = self.run_cycle(&mut last_seen).await {
                        tracing::error!(error = %e, "Polling cycle failed");
                    }
                }
            }
        }
    }

    /// One polling cycle. Returns the number of active jobs processed.
    ///
    /// Exposed for tests; the production loop calls it on a fixed
    /// interval.
    pub async fn run_cycle(
        &self,
        last_seen: &mut HashSet<String>,
    ) -> Result<usize, sqlx::Error> {
        let active = JobRepo::list_active(&self.pool, self.window_hours).await?;
        let mut current: HashSet<String> = HashSet::with_capacity(active.len());

        for job in &active {
            current.insert(job.job_id.clone());

            let refreshed = self
                .monitor
                .refresh(&job.job_id, &job.target_hosts.0, &job.job_kind)
                .await;

            match refreshed {
                Ok(updated) => {
                    let first_seen = !last_seen.contains(&job.job_id);
                    if updated.status != job.status || first_seen {
                        tracing::info!(
                            job_id = %job.job_id,
                            status = updated.status.as_str(),
                            "Job status updated"
                        );
                        self.notifier.notify(
                            JobEvent::new(EVENT_JOB_UPDATE)
                                .with_job(&job.job_id)
                                .with_payload(serde_json::json!({
                                    "job_id": updated.job_id,
                                    "status": updated.status,
                                    "duration_seconds": updated.duration_seconds,
                                    "success_rate": updated.success_rate,
                                    "errors": updated.errors,
                                    "target_hosts": updated.target_hosts.0,
                                })),
                        );
                    }
                }
                Err(e) => {
                    // The monitor already recorded the error state.
                    tracing::error!(job_id = %job.job_id, error = %e, "Failed to refresh job");
                }
            }
        }

        *last_seen = current;

        if !active.is_empty() {
            self.broadcast_stats(active.len()).await;
        }

        Ok(active.len())
    }

    /// End-of-cycle aggregate statistics broadcast.
    async fn broadcast_stats(&self, total_active: usize) {
        let recent = match JobRepo::list_recent(&self.pool, STATS_WINDOW_HOURS, None).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load jobs for stats broadcast");
                return;
            }
        };

        let summary = summarize(&recent, STATS_WINDOW_HOURS);
        self.notifier.notify(
            JobEvent::new(EVENT_DASHBOARD_STATS_UPDATE).with_payload(serde_json::json!({
                "total_active": total_active,
                "success_rate": summary.success_rate,
                "avg_duration": summary.average_duration_minutes,
                "timestamp": Utc::now(),
            })),
        );
    }
}

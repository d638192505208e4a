//! Repository for the `job_records` and `job_status_history` tables.
//!
//! Every write is an upsert keyed by `job_id` plus exactly one history
//! append, applied in a single transaction so a reader never observes a
//! status without its corresponding history entry.

use chrono::{Duration, Utc};
use sqlx::types::Json;

use crate::models::job::{JobObservation, JobRecord, StatusHistoryEntry};
use crate::models::status::{resolve_status, JobStatus};
use crate::DbPool;

/// Column list for `job_records` queries.
const COLUMNS: &str = "\
    job_id, status, job_kind, target_hosts, start_time, end_time, \
    duration_seconds, success_rate, errors, template_id, extra_vars, \
    created_at, updated_at";

/// Provides persistence for batch jobs and their status timelines.
pub struct JobRepo;

impl JobRepo {
    /// Apply one observation: upsert the job record and append one history
    /// entry, atomically.
    ///
    /// A stored terminal status wins over a non-terminal observation (the
    /// record keeps its terminal fields and only `updated_at` moves); the
    /// history entry still records the probe. Returns the record as
    /// stored.
    pub async fn upsert_with_history(
        pool: &DbPool,
        observation: &JobObservation,
        details: &str,
    ) -> Result<JobRecord, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let existing: Option<JobStatus> =
            sqlx::query_scalar("SELECT status FROM job_records WHERE job_id = ?")
                .bind(&observation.job_id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = resolve_status(existing, observation.status);
        let preserved = status != observation.status;

        if preserved {
            tracing::warn!(
                job_id = %observation.job_id,
                stored = status.as_str(),
                observed = observation.status.as_str(),
                "Keeping terminal status over non-terminal observation",
            );
            sqlx::query("UPDATE job_records SET updated_at = ? WHERE job_id = ?")
                .bind(now)
                .bind(&observation.job_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let query = format!(
                "INSERT INTO job_records ({COLUMNS}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (job_id) DO UPDATE SET \
                     status = excluded.status, \
                     job_kind = excluded.job_kind, \
                     target_hosts = excluded.target_hosts, \
                     start_time = excluded.start_time, \
                     end_time = excluded.end_time, \
                     duration_seconds = excluded.duration_seconds, \
                     success_rate = excluded.success_rate, \
                     errors = excluded.errors, \
                     template_id = excluded.template_id, \
                     extra_vars = excluded.extra_vars, \
                     updated_at = excluded.updated_at"
            );
            sqlx::query(&query)
                .bind(&observation.job_id)
                .bind(status)
                .bind(&observation.job_kind)
                .bind(Json(&observation.target_hosts))
                .bind(observation.start_time)
                .bind(observation.end_time)
                .bind(observation.duration_seconds)
                .bind(observation.success_rate)
                .bind(observation.errors.as_ref().map(Json))
                .bind(&observation.template_id)
                .bind(Json(&observation.extra_vars))
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO job_status_history (job_id, status, timestamp, details) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&observation.job_id)
        .bind(status)
        .bind(now)
        .bind(details)
        .execute(&mut *tx)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM job_records WHERE job_id = ?");
        let record = sqlx::query_as::<_, JobRecord>(&query)
            .bind(&observation.job_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// Find a job by its orchestrator-assigned id.
    pub async fn find_by_id(
        pool: &DbPool,
        job_id: &str,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_records WHERE job_id = ?");
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs whose `start_time` falls within the last `hours`, newest
    /// first, optionally filtered by canonical status.
    pub async fn list_recent(
        pool: &DbPool,
        hours: i64,
        status: Option<JobStatus>,
    ) -> Result<Vec<JobRecord>, sqlx::Error> {
        let cutoff = Utc::now() - Duration::hours(hours);

        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM job_records \
                     WHERE start_time > ? AND status = ? \
                     ORDER BY start_time DESC"
                );
                sqlx::query_as::<_, JobRecord>(&query)
                    .bind(cutoff)
                    .bind(status)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM job_records \
                     WHERE start_time > ? \
                     ORDER BY start_time DESC"
                );
                sqlx::query_as::<_, JobRecord>(&query)
                    .bind(cutoff)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// List pending and running jobs within the poller's work window.
    pub async fn list_active(
        pool: &DbPool,
        window_hours: i64,
    ) -> Result<Vec<JobRecord>, sqlx::Error> {
        let cutoff = Utc::now() - Duration::hours(window_hours);
        let query = format!(
            "SELECT {COLUMNS} FROM job_records \
             WHERE start_time > ? AND status IN (?, ?) \
             ORDER BY start_time ASC"
        );
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(cutoff)
            .bind(JobStatus::Pending)
            .bind(JobStatus::Running)
            .fetch_all(pool)
            .await
    }

    /// Full status timeline for a job, oldest first.
    pub async fn history(
        pool: &DbPool,
        job_id: &str,
    ) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT job_id, status, timestamp, details FROM job_status_history \
             WHERE job_id = ? \
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
    }
}

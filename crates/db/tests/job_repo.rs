//! Integration tests for `JobRepo` against a migrated SQLite database.

use chrono::{Duration, Utc};
use retire_db::models::job::JobObservation;
use retire_db::models::status::JobStatus;
use retire_db::repositories::JobRepo;
use sqlx::SqlitePool;

fn observation(job_id: &str, status: JobStatus) -> JobObservation {
    JobObservation {
        job_id: job_id.to_string(),
        status,
        job_kind: "retirement".to_string(),
        target_hosts: vec!["vm1".to_string(), "vm2".to_string()],
        start_time: Utc::now(),
        end_time: None,
        duration_seconds: None,
        success_rate: 0.0,
        errors: None,
        template_id: Some("66".to_string()),
        extra_vars: serde_json::json!({"record_names": ["vm1", "vm2"]}),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn upsert_creates_record_and_history(pool: SqlitePool) {
    let obs = observation("100", JobStatus::Pending);
    let record = JobRepo::upsert_with_history(&pool, &obs, "Job pending")
        .await
        .unwrap();

    assert_eq!(record.job_id, "100");
    assert_eq!(record.status, JobStatus::Pending);
    assert_eq!(record.target_hosts.0, vec!["vm1", "vm2"]);
    assert_eq!(record.template_id.as_deref(), Some("66"));

    let history = JobRepo::history(&pool, "100").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, JobStatus::Pending);
    assert_eq!(history[0].details, "Job pending");
}

#[sqlx::test(migrations = "./migrations")]
async fn every_upsert_appends_exactly_one_history_entry(pool: SqlitePool) {
    let obs = observation("101", JobStatus::Pending);
    JobRepo::upsert_with_history(&pool, &obs, "Job pending")
        .await
        .unwrap();

    let obs = observation("101", JobStatus::Running);
    JobRepo::upsert_with_history(&pool, &obs, "Job running")
        .await
        .unwrap();

    let history = JobRepo::history(&pool, "101").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, JobStatus::Pending);
    assert_eq!(history[1].status, JobStatus::Running);
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_identical_observation_is_idempotent(pool: SqlitePool) {
    let mut obs = observation("102", JobStatus::Running);
    obs.success_rate = 50.0;

    let first = JobRepo::upsert_with_history(&pool, &obs, "Job running")
        .await
        .unwrap();
    let second = JobRepo::upsert_with_history(&pool, &obs, "Job running")
        .await
        .unwrap();

    // Canonical fields unchanged between the two writes; only the history
    // grew.
    assert_eq!(first.status, second.status);
    assert_eq!(first.success_rate, second.success_rate);
    assert_eq!(first.duration_seconds, second.duration_seconds);
    assert_eq!(first.target_hosts.0, second.target_hosts.0);

    let history = JobRepo::history(&pool, "102").await.unwrap();
    assert_eq!(history.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn terminal_status_is_not_regressed_by_later_observation(pool: SqlitePool) {
    let mut obs = observation("103", JobStatus::Successful);
    obs.duration_seconds = Some(300.0);
    obs.success_rate = 100.0;
    JobRepo::upsert_with_history(&pool, &obs, "Job successful")
        .await
        .unwrap();

    // A stale probe claims the job is pending again.
    let stale = observation("103", JobStatus::Pending);
    let record = JobRepo::upsert_with_history(&pool, &stale, "Job pending")
        .await
        .unwrap();

    assert_eq!(record.status, JobStatus::Successful);
    assert_eq!(record.duration_seconds, Some(300.0));
    assert_eq!(record.success_rate, 100.0);

    // The probe is still visible in the timeline, recorded with the
    // status that was kept.
    let history = JobRepo::history(&pool, "103").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].status, JobStatus::Successful);
}

#[sqlx::test(migrations = "./migrations")]
async fn terminal_to_terminal_change_is_applied(pool: SqlitePool) {
    let obs = observation("104", JobStatus::Successful);
    JobRepo::upsert_with_history(&pool, &obs, "Job successful")
        .await
        .unwrap();

    let changed = observation("104", JobStatus::Failed);
    let record = JobRepo::upsert_with_history(&pool, &changed, "Job failed")
        .await
        .unwrap();

    assert_eq!(record.status, JobStatus::Failed);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_recent_filters_by_window_and_status(pool: SqlitePool) {
    let mut fresh = observation("200", JobStatus::Running);
    fresh.start_time = Utc::now();
    JobRepo::upsert_with_history(&pool, &fresh, "Job running")
        .await
        .unwrap();

    let mut old = observation("201", JobStatus::Running);
    old.start_time = Utc::now() - Duration::hours(72);
    JobRepo::upsert_with_history(&pool, &old, "Job running")
        .await
        .unwrap();

    let recent = JobRepo::list_recent(&pool, 24, None).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].job_id, "200");

    let failed = JobRepo::list_recent(&pool, 24, Some(JobStatus::Failed))
        .await
        .unwrap();
    assert!(failed.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn list_active_returns_pending_and_running_only(pool: SqlitePool) {
    for (id, status) in [
        ("300", JobStatus::Pending),
        ("301", JobStatus::Running),
        ("302", JobStatus::Successful),
        ("303", JobStatus::Error),
    ] {
        let obs = observation(id, status);
        JobRepo::upsert_with_history(&pool, &obs, "observed")
            .await
            .unwrap();
    }

    let active = JobRepo::list_active(&pool, 48).await.unwrap();
    let ids: Vec<&str> = active.iter().map(|j| j.job_id.as_str()).collect();
    assert_eq!(ids, vec!["300", "301"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn find_by_id_returns_none_for_unknown_job(pool: SqlitePool) {
    let missing = JobRepo::find_by_id(&pool, "nope").await.unwrap();
    assert!(missing.is_none());
}

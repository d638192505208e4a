//! Aggregate statistics over a window of job records.

use serde::Serialize;

use super::job::JobRecord;
use super::status::JobStatus;

/// Summary block returned alongside job listings and dashboard reads.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobSummary {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    /// Percentage of jobs in the window that finished successfully.
    pub success_rate: f64,
    /// Mean duration of successful jobs with a known duration, in minutes.
    pub average_duration_minutes: f64,
    pub jobs_per_hour: f64,
}

/// Compute summary statistics for the given records over a window of
/// `hours`. `completed` counts successful jobs only; jobs that errored or
/// are unknown contribute to the totals but to neither completed nor
/// failed.
pub fn summarize(jobs: &[JobRecord], hours: i64) -> JobSummary {
    let total_jobs = jobs.len();
    let active_jobs = jobs.iter().filter(|j| j.status.is_active()).count();
    let completed_jobs = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Successful)
        .count();
    let failed_jobs = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Failed)
        .count();

    let success_rate = if total_jobs > 0 {
        completed_jobs as f64 / total_jobs as f64 * 100.0
    } else {
        0.0
    };

    let completed_durations: Vec<f64> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Successful)
        .filter_map(|j| j.duration_seconds)
        .collect();
    let average_duration_minutes = if completed_durations.is_empty() {
        0.0
    } else {
        completed_durations.iter().sum::<f64>() / completed_durations.len() as f64 / 60.0
    };

    let jobs_per_hour = total_jobs as f64 / hours.max(1) as f64;

    JobSummary {
        total_jobs,
        active_jobs,
        completed_jobs,
        failed_jobs,
        success_rate,
        average_duration_minutes,
        jobs_per_hour,
    }
}

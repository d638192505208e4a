//! Job record models and DTOs.

use retire_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::status::JobStatus;

/// A row from the `job_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    /// Free-form label (e.g. "retirement"); display/filtering only.
    pub job_kind: String,
    pub target_hosts: Json<Vec<String>>,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub duration_seconds: Option<f64>,
    pub success_rate: f64,
    pub errors: Option<Json<Vec<String>>>,
    pub template_id: Option<String>,
    /// Exact parameter payload sent at launch, kept for audit.
    pub extra_vars: Json<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The full job state produced by one launcher or monitor observation,
/// before it is reconciled with what the store already holds.
#[derive(Debug, Clone)]
pub struct JobObservation {
    pub job_id: String,
    pub status: JobStatus,
    pub job_kind: String,
    pub target_hosts: Vec<String>,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub duration_seconds: Option<f64>,
    pub success_rate: f64,
    pub errors: Option<Vec<String>>,
    pub template_id: Option<String>,
    pub extra_vars: serde_json::Value,
}

/// A row from the append-only `job_status_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusHistoryEntry {
    pub job_id: String,
    pub status: JobStatus,
    pub timestamp: Timestamp,
    pub details: String,
}

/// Query parameters for `GET /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    /// Recency window in hours. Defaults to 24.
    pub hours: Option<i64>,
    /// Optional canonical status filter.
    pub status: Option<JobStatus>,
}

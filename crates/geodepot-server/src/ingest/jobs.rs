//! Import job records and the tracker that mutates them
//!
//! The tracker is the only writer of job progress. Every update is a single
//! independently committed statement so a concurrent status poll always
//! observes the latest committed progress, and terminal rows are guarded in
//! SQL so a job can never leave `completed` or `failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Job lifecycle states. Transitions are monotonic:
/// `Queued -> Processing -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving to `next` respects the monotonic state machine
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match self {
            JobStatus::Queued => matches!(next, JobStatus::Processing | JobStatus::Failed),
            JobStatus::Processing => next.is_terminal(),
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One import job row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImportJob {
    pub id: i64,
    pub layer_name: String,
    pub status: String,
    pub total: Option<i32>,
    pub processed: i32,
    pub errors: i32,
    pub message: Option<String>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportJob {
    /// Parsed status; falls back to `Failed` for unknown strings
    pub fn job_status(&self) -> JobStatus {
        self.status.parse().unwrap_or(JobStatus::Failed)
    }
}

/// Typed partial update for a job row
///
/// Only fields that are `Some` change; `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub total: Option<i32>,
    pub processed: Option<i32>,
    pub errors: Option<i32>,
    pub message: Option<String>,
}

impl JobUpdate {
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_total(mut self, total: i32) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_progress(mut self, processed: i32, errors: i32) -> Self {
        self.processed = Some(processed);
        self.errors = Some(errors);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Tracker errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Import job {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Insert a new `queued` job record and return its id
pub async fn create(pool: &PgPool, layer_name: &str, file_path: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO import_jobs (layer_name, status, file_path)
        VALUES ($1, 'queued', $2)
        RETURNING id
        "#,
    )
    .bind(layer_name)
    .bind(file_path)
    .fetch_one(pool)
    .await
}

/// Apply a partial update to a job row
///
/// Terminal rows are left untouched by the SQL guard, which is what makes
/// completed and failed jobs immutable.
pub async fn update(pool: &PgPool, job_id: i64, update: &JobUpdate) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE import_jobs
        SET status = COALESCE($2, status),
            total = COALESCE($3, total),
            processed = COALESCE($4, processed),
            errors = COALESCE($5, errors),
            message = COALESCE($6, message),
            updated_at = now()
        WHERE id = $1
          AND status NOT IN ('completed', 'failed')
        "#,
    )
    .bind(job_id)
    .bind(update.status.map(JobStatus::as_str))
    .bind(update.total)
    .bind(update.processed)
    .bind(update.errors)
    .bind(update.message.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

/// Claim a queued job for processing
///
/// Returns `false` when the job is not in `queued` state, which makes
/// re-submission of an in-flight or finished job a rejected no-op.
pub async fn try_begin(pool: &PgPool, job_id: i64) -> Result<bool, sqlx::Error> {
    let claimed = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE import_jobs
        SET status = 'processing', updated_at = now()
        WHERE id = $1 AND status = 'queued'
        RETURNING id
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    Ok(claimed.is_some())
}

/// Fetch a job by id
pub async fn get(pool: &PgPool, job_id: i64) -> Result<ImportJob, JobError> {
    sqlx::query_as::<_, ImportJob>(
        r#"
        SELECT id, layer_name, status, total, processed, errors,
               message, file_path, created_at, updated_at
        FROM import_jobs
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?
    .ok_or(JobError::NotFound(job_id))
}

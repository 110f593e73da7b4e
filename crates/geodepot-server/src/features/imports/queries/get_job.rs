//! Get import job query
//!
//! Read side of the job tracker: returns progress for one job id. The
//! spooled file path is internal and not exposed here.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::ingest::jobs::{self, ImportJob, JobError};

/// Query to get an import job by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobQuery {
    pub job_id: i64,
}

/// Job progress as returned to status pollers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub id: i64,
    pub layer_name: String,
    pub status: String,
    pub total: Option<i32>,
    pub processed: i32,
    pub errors: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ImportJob> for JobStatusView {
    fn from(job: ImportJob) -> Self {
        Self {
            id: job.id,
            layer_name: job.layer_name,
            status: job.status,
            total: job.total,
            processed: job.processed,
            errors: job.errors,
            message: job.message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

impl Request<Result<JobStatusView, JobError>> for GetJobQuery {}

pub async fn handle(pool: &PgPool, query: GetJobQuery) -> Result<JobStatusView, JobError> {
    let job = jobs::get(pool, query.job_id).await?;
    Ok(job.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_hides_file_path() {
        let job = ImportJob {
            id: 9,
            layer_name: "roads".to_string(),
            status: "processing".to_string(),
            total: Some(100),
            processed: 50,
            errors: 1,
            message: Some("Inserted 50/100. Errors: 1".to_string()),
            file_path: Some("/tmp/upload-abc.geojson".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = JobStatusView::from(job);
        let encoded = serde_json::to_value(&view).unwrap();

        assert_eq!(encoded["id"], 9);
        assert_eq!(encoded["status"], "processing");
        assert!(encoded.get("file_path").is_none());
    }
}

//! Submit import command
//!
//! Spools the upload, registers a `queued` job, and hands the work to the
//! background queue. The caller gets a job id back immediately; everything
//! else happens on the worker.

use std::path::Path;

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::features::shared::validation::{
    validate_layer_name, validate_srid, LayerNameValidationError, SridValidationError,
};
use crate::ingest::jobs::{self, JobStatus, JobUpdate};
use crate::ingest::layers;
use crate::ingest::spool::SpooledUpload;
use crate::ingest::worker::ImportQueue;
use crate::ingest::ImportTask;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitImportCommand {
    pub layer_name: String,
    pub srid: i32,
    pub filename: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitImportResponse {
    pub job_id: i64,
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitImportError {
    #[error("{0}")]
    LayerName(#[from] LayerNameValidationError),
    #[error("{0}")]
    Srid(#[from] SridValidationError),
    #[error("Upload is required and cannot be empty")]
    ContentRequired,
    #[error("Failed to spool upload: {0}")]
    Spool(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Import could not be scheduled: {0}")]
    Queue(String),
}

impl Request<Result<SubmitImportResponse, SubmitImportError>> for SubmitImportCommand {}

impl SubmitImportCommand {
    pub fn validate(&self) -> Result<(), SubmitImportError> {
        validate_layer_name(&self.layer_name)?;
        validate_srid(self.srid)?;
        if self.content.is_empty() {
            return Err(SubmitImportError::ContentRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, queue, spool_dir, command), fields(layer = %command.layer_name, srid = command.srid))]
pub async fn handle(
    pool: &PgPool,
    queue: &ImportQueue,
    spool_dir: &Path,
    command: SubmitImportCommand,
) -> Result<SubmitImportResponse, SubmitImportError> {
    command.validate()?;

    // Register the layer eagerly so it shows up in listings before the
    // first batch lands. The pipeline repeats this upsert authoritatively.
    if let Err(err) = layers::upsert(
        pool,
        &command.layer_name,
        Some(&command.layer_name),
        command.srid,
    )
    .await
    {
        warn!(error = %err, "Eager layer upsert failed; pipeline will retry");
    }

    let upload = SpooledUpload::acquire(spool_dir, &command.filename, &command.content).await?;

    let job_id = match jobs::create(pool, &command.layer_name, &upload.path().to_string_lossy()).await
    {
        Ok(id) => id,
        Err(err) => {
            upload.release().await;
            return Err(err.into());
        },
    };

    let task = ImportTask {
        job_id,
        layer_name: command.layer_name.clone(),
        srid: command.srid,
        upload,
    };

    if let Err(rejected) = queue.enqueue(task) {
        let reason = rejected.reason.to_string();
        warn!(job_id, %reason, "Import task rejected by the queue");

        let update = JobUpdate::default()
            .with_status(JobStatus::Failed)
            .with_message(format!("Import could not be scheduled: {}", reason));
        if let Err(err) = jobs::update(pool, job_id, &update).await {
            error!(job_id, error = %err, "Failed to record rejected job");
        }
        rejected.task.upload.release().await;

        return Err(SubmitImportError::Queue(reason));
    }

    info!(job_id, size = command.content.len(), "Import job queued");

    Ok(SubmitImportResponse {
        job_id,
        status: JobStatus::Queued.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> SubmitImportCommand {
        SubmitImportCommand {
            layer_name: "pop-density".to_string(),
            srid: 4326,
            filename: "pop.geojson".to_string(),
            content: b"{\"features\":[]}".to_vec(),
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_layer_name() {
        let cmd = SubmitImportCommand {
            layer_name: "  ".to_string(),
            ..command()
        };
        assert!(matches!(cmd.validate(), Err(SubmitImportError::LayerName(_))));
    }

    #[test]
    fn test_validation_unaddressable_layer_name() {
        let cmd = SubmitImportCommand {
            layer_name: "***".to_string(),
            ..command()
        };
        assert!(matches!(
            cmd.validate(),
            Err(SubmitImportError::LayerName(LayerNameValidationError::NotAddressable))
        ));
    }

    #[test]
    fn test_validation_bad_srid() {
        let cmd = SubmitImportCommand {
            srid: 0,
            ..command()
        };
        assert!(matches!(cmd.validate(), Err(SubmitImportError::Srid(_))));
    }

    #[test]
    fn test_validation_empty_content() {
        let cmd = SubmitImportCommand {
            content: Vec::new(),
            ..command()
        };
        assert!(matches!(cmd.validate(), Err(SubmitImportError::ContentRequired)));
    }
}

//! Background import pipeline
//!
//! Drives one import job from `processing` to a terminal state: parse the
//! spooled upload, resolve the target layer once, stream features through
//! batched inserts with row-level fallback, and keep the job tracker
//! current after every flush. The spooled upload is released on every exit
//! path.

use sqlx::PgPool;
use tracing::{error, info, warn};

use super::config::IngestConfig;
use super::error::ImportError;
use super::geojson;
use super::jobs::{self, JobStatus, JobUpdate};
use super::layers;
use super::spool::SpooledUpload;
use super::storage::{self, FeatureRow};

/// One unit of queued import work
#[derive(Debug)]
pub struct ImportTask {
    pub job_id: i64,
    pub layer_name: String,
    pub srid: i32,
    pub upload: SpooledUpload,
}

/// The import pipeline
pub struct ImportPipeline {
    db: PgPool,
    config: IngestConfig,
}

impl ImportPipeline {
    pub fn new(db: PgPool, config: IngestConfig) -> Self {
        Self {
            db,
            config,
        }
    }

    /// Run one import job to completion or failure
    ///
    /// Never propagates an error: outcomes land in the job record, and the
    /// spooled upload is always released.
    pub async fn run(&self, task: ImportTask) {
        match jobs::try_begin(&self.db, task.job_id).await {
            Ok(true) => {},
            Ok(false) => {
                warn!(job_id = task.job_id, "Import job is not queued; skipping re-submission");
                task.upload.release().await;
                return;
            },
            Err(err) => {
                error!(job_id = task.job_id, error = %err, "Could not claim import job");
                self.mark_failed(task.job_id, &format!("Storage unavailable: {}", err))
                    .await;
                task.upload.release().await;
                return;
            },
        }

        if let Err(err) = self.execute(&task).await {
            error!(job_id = task.job_id, error = %err, "Import job failed");
            self.mark_failed(task.job_id, &err.to_string()).await;
        }

        task.upload.release().await;
    }

    /// Parse, batch, and insert; finalizes the job on success
    async fn execute(&self, task: &ImportTask) -> Result<(), ImportError> {
        info!(
            job_id = task.job_id,
            layer = %task.layer_name,
            srid = task.srid,
            size = task.upload.size(),
            checksum = %task.upload.checksum(),
            "Starting import job"
        );

        let raw = task.upload.read().await?;
        let collection = geojson::parse_collection(&raw)?;

        let total = collection.len() as i32;
        jobs::update(&self.db, task.job_id, &JobUpdate::default().with_total(total)).await?;

        // Resolve the layer once; its id is reused for every insert below.
        let layer_id =
            layers::upsert(&self.db, &task.layer_name, Some(&task.layer_name), task.srid).await?;

        let mut processed = 0i32;
        let mut errors = 0i32;
        let mut samples: Vec<String> = Vec::new();
        let mut batch: Vec<FeatureRow> = Vec::with_capacity(self.config.batch_size);

        for feature in &collection.features {
            let Some(geometry) = &feature.geometry else {
                // Never batched, only counted.
                errors += 1;
                continue;
            };

            batch.push(FeatureRow::new(geometry, &feature.properties));

            if batch.len() >= self.config.batch_size {
                self.flush(task, layer_id, total, &mut batch, &mut processed, &mut errors, &mut samples)
                    .await?;
            }
        }

        if !batch.is_empty() {
            self.flush(task, layer_id, total, &mut batch, &mut processed, &mut errors, &mut samples)
                .await?;
        }

        let final_message = format!(
            "Completed. Inserted {}/{}. Errors: {}.{}",
            processed,
            total,
            errors,
            sample_suffix(&samples)
        );
        let update = JobUpdate::default()
            .with_status(JobStatus::Completed)
            .with_progress(processed, errors)
            .with_message(final_message);
        jobs::update(&self.db, task.job_id, &update).await?;

        info!(job_id = task.job_id, processed, errors, "Import job completed");
        Ok(())
    }

    /// Flush the current batch, degrading to row-level inserts on failure,
    /// then persist updated progress so pollers see it
    #[allow(clippy::too_many_arguments)]
    async fn flush(
        &self,
        task: &ImportTask,
        layer_id: i64,
        total: i32,
        batch: &mut Vec<FeatureRow>,
        processed: &mut i32,
        errors: &mut i32,
        samples: &mut Vec<String>,
    ) -> Result<(), ImportError> {
        let cap = self.config.error_samples;

        let message = match storage::flush_batch(&self.db, layer_id, task.srid, batch).await {
            Ok(()) => {
                *processed += batch.len() as i32;
                format!("Inserted {}/{}. Errors: {}", processed, total, errors)
            },
            Err(err) => {
                warn!(
                    job_id = task.job_id,
                    layer_id,
                    error = %err,
                    "Batch insert failed; falling back to row inserts"
                );
                if samples.len() < cap {
                    samples.push(format!("batch error: {}", err));
                }

                let inserted = storage::flush_rows(
                    &self.db,
                    layer_id,
                    task.srid,
                    batch,
                    self.config.row_commit_every,
                    |row_err| {
                        if samples.len() < cap {
                            samples.push(format!("row error: {}", row_err));
                        }
                    },
                )
                .await?;

                *processed += inserted as i32;
                *errors += (batch.len() - inserted) as i32;

                format!(
                    "Batch fallback: {}/{} inserted. Errors: {}.{}",
                    inserted,
                    batch.len(),
                    errors,
                    sample_suffix(samples)
                )
            },
        };

        batch.clear();

        let update = JobUpdate::default()
            .with_progress(*processed, *errors)
            .with_message(message);
        jobs::update(&self.db, task.job_id, &update).await?;

        Ok(())
    }

    /// Best-effort terminal failure update
    async fn mark_failed(&self, job_id: i64, message: &str) {
        let update = JobUpdate::default()
            .with_status(JobStatus::Failed)
            .with_message(message);
        if let Err(err) = jobs::update(&self.db, job_id, &update).await {
            error!(job_id, error = %err, "Failed to record job failure");
        }
    }
}

fn sample_suffix(samples: &[String]) -> String {
    if samples.is_empty() {
        String::new()
    } else {
        format!(" Samples: {}", samples.join("; "))
    }
}

//! Import routes
//!
//! POST /imports       -> start a background import, returns job_id
//! GET  /imports/:id   -> job status

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use crate::ingest::jobs::JobError;
use crate::ingest::CANONICAL_SRID;

use super::commands::{submit, SubmitImportCommand, SubmitImportError};
use super::queries::{get_job, GetJobQuery};

pub fn imports_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(submit_import))
        .route("/:job_id", get(get_import_job))
}

#[tracing::instrument(skip(state, multipart))]
async fn submit_import(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, ImportApiError> {
    let mut content: Option<Vec<u8>> = None;
    let mut filename = String::from("upload.geojson");
    let mut layer_name: Option<String> = None;
    let mut srid = CANONICAL_SRID;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImportApiError::Multipart(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                if let Some(name) = field.file_name() {
                    filename = name.to_string();
                }
                let data = field.bytes().await.map_err(|e| {
                    ImportApiError::Multipart(format!("Failed to read file bytes: {}", e))
                })?;
                content = Some(data.to_vec());
            },
            "layer_name" => {
                let value = field.text().await.map_err(|e| {
                    ImportApiError::Multipart(format!("Failed to read layer_name: {}", e))
                })?;
                layer_name = Some(value);
            },
            "srid" => {
                let value = field.text().await.map_err(|e| {
                    ImportApiError::Multipart(format!("Failed to read srid: {}", e))
                })?;
                srid = value
                    .trim()
                    .parse()
                    .map_err(|_| ImportApiError::Multipart(format!("Invalid srid: {}", value)))?;
            },
            _ => {},
        }
    }

    let command = SubmitImportCommand {
        layer_name: layer_name
            .ok_or_else(|| ImportApiError::Multipart("No layer_name field found".to_string()))?,
        srid,
        filename,
        content: content
            .ok_or_else(|| ImportApiError::Multipart("No file field found".to_string()))?,
    };

    let response =
        submit::handle(&state.db, &state.queue, &state.ingest.spool_dir, command).await?;

    tracing::info!(job_id = response.job_id, "Import submitted via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state))]
async fn get_import_job(
    State(state): State<FeatureState>,
    Path(job_id): Path<i64>,
) -> Result<Response, ImportApiError> {
    let view = get_job::handle(&state.db, GetJobQuery { job_id }).await?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

#[derive(Debug)]
enum ImportApiError {
    Submit(SubmitImportError),
    Job(JobError),
    Multipart(String),
}

impl From<SubmitImportError> for ImportApiError {
    fn from(err: SubmitImportError) -> Self {
        Self::Submit(err)
    }
}

impl From<JobError> for ImportApiError {
    fn from(err: JobError) -> Self {
        Self::Job(err)
    }
}

impl IntoResponse for ImportApiError {
    fn into_response(self) -> Response {
        match self {
            ImportApiError::Multipart(message) => {
                let error = ErrorResponse::new("BAD_REQUEST", message);
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            ImportApiError::Submit(
                err @ (SubmitImportError::LayerName(_)
                | SubmitImportError::Srid(_)
                | SubmitImportError::ContentRequired),
            ) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", err.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            ImportApiError::Submit(SubmitImportError::Queue(reason)) => {
                let error = ErrorResponse::new("QUEUE_UNAVAILABLE", reason);
                (StatusCode::SERVICE_UNAVAILABLE, Json(error)).into_response()
            },
            ImportApiError::Submit(err) => {
                tracing::error!(error = %err, "Import submission failed");
                let error = ErrorResponse::new("INTERNAL_ERROR", "Failed to submit import");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            ImportApiError::Job(JobError::NotFound(job_id)) => {
                let error = ErrorResponse::new("NOT_FOUND", format!("Import job {} not found", job_id));
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            ImportApiError::Job(JobError::Database(err)) => {
                tracing::error!(error = %err, "Job status query failed");
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

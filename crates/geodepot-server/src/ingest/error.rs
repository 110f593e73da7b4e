//! Ingestion error types
//!
//! Only structural parse failures and store unavailability are fatal to a
//! job. Per-feature problems (missing geometry, a bad row inside a batch)
//! are recovered where they occur and tallied in the job counters, so they
//! never appear here.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that terminate an import job
#[derive(Error, Debug)]
pub enum ImportError {
    /// The upload is unreadable or not a feature collection.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backing store is unreachable or rejected a statement outside the
    /// recoverable batch/row paths.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The spooled upload could not be read back.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

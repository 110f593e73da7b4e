//! Error types shared across the Geodepot workspace

use thiserror::Error;

/// Result type alias for Geodepot operations
pub type Result<T> = std::result::Result<T, GeodepotError>;

/// Main error type for Geodepot
#[derive(Error, Debug)]
pub enum GeodepotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

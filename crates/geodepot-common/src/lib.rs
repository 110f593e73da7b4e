//! Geodepot Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the Geodepot workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: Upload integrity fingerprints
//! - **Logging**: Centralized tracing initialization
//!
//! # Example
//!
//! ```no_run
//! use geodepot_common::{Result, GeodepotError};
//! use geodepot_common::checksum::{compute_file_checksum, ChecksumAlgorithm};
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let checksum = compute_file_checksum(path, ChecksumAlgorithm::Sha256)?;
//!     tracing::info!(%checksum, "upload fingerprinted");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{GeodepotError, Result};

//! Transient storage for uploaded payloads
//!
//! The HTTP request that carries an upload finishes long before the import
//! does, so the payload is spooled to disk and handed to the worker by
//! path. Release runs on every pipeline exit path; a failed removal is
//! logged and never escalated into job failure.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use geodepot_common::checksum::{compute_checksum, ChecksumAlgorithm};
use uuid::Uuid;

/// A payload parked in the spool directory
#[derive(Debug)]
pub struct SpooledUpload {
    path: PathBuf,
    size: u64,
    checksum: String,
}

impl SpooledUpload {
    /// Write `content` to a uniquely named file under `spool_dir`
    ///
    /// The original filename's extension is kept as a suffix for operator
    /// debugging; the name itself is replaced with a fresh UUID.
    pub async fn acquire(
        spool_dir: &Path,
        original_filename: &str,
        content: &[u8],
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(spool_dir).await?;

        let suffix = Path::new(original_filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".geojson".to_string());
        let path = spool_dir.join(format!("upload-{}{}", Uuid::new_v4(), suffix));

        tokio::fs::write(&path, content).await?;

        let checksum = compute_checksum(&mut Cursor::new(content), ChecksumAlgorithm::Sha256)
            .map_err(std::io::Error::other)?;

        tracing::debug!(
            path = %path.display(),
            size = content.len(),
            %checksum,
            "Upload spooled"
        );

        Ok(Self {
            path,
            size: content.len() as u64,
            checksum,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// SHA-256 fingerprint of the spooled payload
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Read the payload back from disk
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Remove the spooled file
    ///
    /// Idempotent; removal failures are logged at `warn` and swallowed.
    pub async fn release(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Spooled upload removed");
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "Failed to remove spooled upload"
                );
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let upload = SpooledUpload::acquire(dir.path(), "cities.geojson", b"{\"features\":[]}")
            .await
            .unwrap();

        assert_eq!(upload.size(), 15);
        assert!(upload.path().to_string_lossy().ends_with(".geojson"));
        assert_eq!(upload.read().await.unwrap(), b"{\"features\":[]}");
    }

    #[tokio::test]
    async fn test_suffix_follows_original_filename() {
        let dir = tempfile::tempdir().unwrap();
        let upload = SpooledUpload::acquire(dir.path(), "dump.json", b"{}").await.unwrap();
        assert!(upload.path().to_string_lossy().ends_with(".json"));
        upload.release().await;
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let upload = SpooledUpload::acquire(dir.path(), "a.geojson", b"{}").await.unwrap();

        assert!(upload.path().exists());
        upload.release().await;
        assert!(!upload.path().exists());
        // Second release is a quiet no-op.
        upload.release().await;
    }

    #[tokio::test]
    async fn test_checksum_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let a = SpooledUpload::acquire(dir.path(), "a.geojson", b"same bytes").await.unwrap();
        let b = SpooledUpload::acquire(dir.path(), "b.geojson", b"same bytes").await.unwrap();

        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.path(), b.path());

        a.release().await;
        b.release().await;
    }
}

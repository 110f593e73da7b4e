//! Ingestion configuration

use std::path::PathBuf;

/// Default number of features flushed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default cap on quoted error samples retained for a job summary.
pub const DEFAULT_ERROR_SAMPLES: usize = 5;

/// Default number of successful fallback rows between commits.
pub const DEFAULT_ROW_COMMIT_EVERY: usize = 20;

/// Default number of worker tasks draining the import queue.
pub const DEFAULT_WORKERS: usize = 1;

/// Default capacity of the import queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Tuning knobs for the import pipeline, loaded from the environment
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Features per bulk insert (`IMPORT_BATCH_SIZE`)
    pub batch_size: usize,
    /// Cap on quoted error samples (`IMPORT_ERROR_SAMPLES`)
    pub error_samples: usize,
    /// Commit interval for row-level fallback inserts (`IMPORT_ROW_COMMIT_EVERY`)
    pub row_commit_every: usize,
    /// Directory for spooled uploads (`IMPORT_SPOOL_DIR`)
    pub spool_dir: PathBuf,
    /// Worker tasks draining the queue (`IMPORT_WORKERS`)
    pub workers: usize,
    /// Bounded queue capacity (`IMPORT_QUEUE_DEPTH`)
    pub queue_depth: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            error_samples: DEFAULT_ERROR_SAMPLES,
            row_commit_every: DEFAULT_ROW_COMMIT_EVERY,
            spool_dir: std::env::temp_dir(),
            workers: DEFAULT_WORKERS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            batch_size: env_usize("IMPORT_BATCH_SIZE", defaults.batch_size).max(1),
            error_samples: env_usize("IMPORT_ERROR_SAMPLES", defaults.error_samples),
            row_commit_every: env_usize("IMPORT_ROW_COMMIT_EVERY", defaults.row_commit_every),
            spool_dir: std::env::var("IMPORT_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.spool_dir),
            workers: env_usize("IMPORT_WORKERS", defaults.workers).max(1),
            queue_depth: env_usize("IMPORT_QUEUE_DEPTH", defaults.queue_depth).max(1),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.error_samples, 5);
        assert_eq!(config.row_commit_every, 20);
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_env_usize_fallback() {
        std::env::remove_var("IMPORT_TEST_UNSET");
        assert_eq!(env_usize("IMPORT_TEST_UNSET", 7), 7);

        std::env::set_var("IMPORT_TEST_BAD", "not-a-number");
        assert_eq!(env_usize("IMPORT_TEST_BAD", 7), 7);
        std::env::remove_var("IMPORT_TEST_BAD");

        std::env::set_var("IMPORT_TEST_OK", "12");
        assert_eq!(env_usize("IMPORT_TEST_OK", 7), 12);
        std::env::remove_var("IMPORT_TEST_OK");
    }
}

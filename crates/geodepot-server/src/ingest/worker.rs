//! Import queue and background workers
//!
//! Submission enqueues an [`ImportTask`] on a bounded channel and returns
//! immediately; worker tasks spawned at startup drain the channel and drive
//! the pipeline. This keeps the HTTP-facing layer's lifetime decoupled from
//! pipeline execution without reaching for a durable distributed queue.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use super::config::IngestConfig;
use super::pipeline::{ImportPipeline, ImportTask};

/// Why the queue refused a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("import queue is full")]
    Full,
    #[error("import workers are not running")]
    Closed,
}

/// A task the queue handed back instead of accepting
///
/// The caller keeps ownership of the task (and its spooled upload) so it
/// can clean up and fail the job record.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct RejectedImport {
    pub task: ImportTask,
    pub reason: EnqueueError,
}

/// Submission-side handle to the import queue
#[derive(Clone)]
pub struct ImportQueue {
    tx: mpsc::Sender<ImportTask>,
}

impl ImportQueue {
    /// Create a bounded queue; the receiver goes to [`ImportWorker::spawn`]
    pub fn new(depth: usize) -> (Self, mpsc::Receiver<ImportTask>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a task without blocking the submitting request
    pub fn enqueue(&self, task: ImportTask) -> Result<(), RejectedImport> {
        self.tx.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(task) => RejectedImport {
                task,
                reason: EnqueueError::Full,
            },
            mpsc::error::TrySendError::Closed(task) => RejectedImport {
                task,
                reason: EnqueueError::Closed,
            },
        })
    }
}

/// Background workers draining the import queue
pub struct ImportWorker {
    db: PgPool,
    config: IngestConfig,
}

impl ImportWorker {
    pub fn new(db: PgPool, config: IngestConfig) -> Self {
        Self {
            db,
            config,
        }
    }

    /// Spawn the configured number of worker tasks
    ///
    /// Workers share the receiver and run until the queue closes (all
    /// submission handles dropped).
    pub fn spawn(self, rx: mpsc::Receiver<ImportTask>) -> Vec<tokio::task::JoinHandle<()>> {
        let rx = Arc::new(Mutex::new(rx));
        let workers = self.config.workers.max(1);

        (0..workers)
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let pipeline = ImportPipeline::new(self.db.clone(), self.config.clone());

                tokio::spawn(async move {
                    info!(worker, "Import worker started");

                    loop {
                        let task = { rx.lock().await.recv().await };
                        match task {
                            Some(task) => pipeline.run(task).await,
                            None => break,
                        }
                    }

                    info!(worker, "Import worker stopped");
                })
            })
            .collect()
    }
}

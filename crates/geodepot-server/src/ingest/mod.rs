//! Background GeoJSON ingestion
//!
//! The ingestion engine loads uploaded feature collections into the spatial
//! store while the submitting request gets on with its life:
//!
//! 1. Submission spools the upload, records a `queued` job, and enqueues an
//!    [`pipeline::ImportTask`].
//! 2. A worker claims the job (`queued -> processing`), parses the
//!    collection, and resolves the target layer once.
//! 3. Features are inserted in fixed-size batches; a failed batch degrades
//!    to row-level inserts that skip bad records.
//! 4. Progress is persisted after every flush; the job ends `completed` or
//!    `failed` and the spooled upload is removed either way.

pub mod config;
pub mod error;
pub mod geojson;
pub mod jobs;
pub mod layers;
pub mod pipeline;
pub mod spool;
pub mod storage;
pub mod worker;

pub use config::IngestConfig;
pub use error::ImportError;
pub use pipeline::{ImportPipeline, ImportTask};
pub use storage::CANONICAL_SRID;
pub use worker::{ImportQueue, ImportWorker};

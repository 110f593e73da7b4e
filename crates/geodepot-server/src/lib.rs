//! Geodepot Server Library
//!
//! HTTP server for a generic spatial feature store with background GeoJSON
//! ingestion.
//!
//! # Overview
//!
//! - **Imports**: uploads are spooled to disk, tracked as jobs, and loaded
//!   into PostGIS by background workers with batched inserts and row-level
//!   fallback
//! - **Layers**: named feature collections created lazily on first import
//! - **Database**: PostgreSQL/PostGIS via SQLx with versioned migrations
//! - **Configuration**: environment-based configuration management
//!
//! # Architecture
//!
//! The HTTP surface follows a CQRS feature-slice layout (`features/`),
//! while the ingestion engine (`ingest/`) owns all writes to the feature
//! store and the job tracker. Submission and execution are decoupled by a
//! bounded in-process queue: the request returns as soon as a `queued` job
//! row exists, and a worker drives the job through
//! `processing -> completed | failed`.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework (multipart upload handling)
//! - **SQLx**: PostgreSQL driver and migrations
//! - **Tower / tower-http**: middleware (tracing, CORS, compression)
//!
//! # Example
//!
//! ```no_run
//! use geodepot_server::{config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     db::run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;

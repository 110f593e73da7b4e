//! Feature modules implementing the Geodepot API
//!
//! Each feature is a vertical slice following the CQRS (Command Query
//! Responsibility Segregation) pattern:
//!
//! - **imports**: background GeoJSON import submission and job status
//! - **layers**: read-only layer listing with feature counts
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate, keeping handlers easy to test in isolation.

pub mod imports;
pub mod layers;
pub mod shared;

use axum::Router;

use crate::ingest::{ImportQueue, IngestConfig};

/// Shared state for feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: sqlx::PgPool,
    /// Submission-side handle to the background import queue
    pub queue: ImportQueue,
    /// Ingestion tuning knobs (spool directory, batch sizing)
    pub ingest: IngestConfig,
}

/// Creates the API router with all feature routes mounted
///
/// - `/imports` - Import submission and job status
/// - `/layers` - Layer listing
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/imports", imports::imports_routes().with_state(state.clone()))
        .nest("/layers", layers::layers_routes().with_state(state.db.clone()))
}

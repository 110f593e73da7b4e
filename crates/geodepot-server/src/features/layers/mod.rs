//! Layer feature slice
//!
//! Read-only listing of registered layers; layers themselves are created
//! lazily by the ingestion engine.

pub mod queries;
pub mod routes;

pub use routes::layers_routes;

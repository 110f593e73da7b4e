//! Import feature slice
//!
//! Submission and status polling for background GeoJSON imports.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::imports_routes;

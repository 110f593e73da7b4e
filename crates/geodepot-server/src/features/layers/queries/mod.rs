//! Layer queries

pub mod list_layers;

pub use list_layers::{ListLayersQuery, ListLayersResponse};

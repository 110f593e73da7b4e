//! List layers query
//!
//! Returns every registered layer with its feature count. Transient store
//! outages degrade to an empty list with an advisory note so polling UIs
//! keep rendering.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::ingest::layers::{self, LayerSummary};

/// Query to list layers with feature counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListLayersQuery {}

/// Layer listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListLayersResponse {
    pub layers: Vec<LayerSummary>,
    /// Advisory set to `"db_unavailable"` when the store was unreachable
    /// and an empty listing was substituted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Request<Result<ListLayersResponse, sqlx::Error>> for ListLayersQuery {}

pub async fn handle(pool: &PgPool, _query: ListLayersQuery) -> Result<ListLayersResponse, sqlx::Error> {
    let listing = layers::list(pool).await?;

    Ok(ListLayersResponse {
        layers: listing.layers,
        note: listing.note.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_is_omitted_when_absent() {
        let response = ListLayersResponse {
            layers: Vec::new(),
            note: None,
        };
        let encoded = serde_json::to_value(&response).unwrap();
        assert!(encoded.get("note").is_none());
    }

    #[test]
    fn test_note_is_present_when_degraded() {
        let response = ListLayersResponse {
            layers: Vec::new(),
            note: Some("db_unavailable".to_string()),
        };
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["note"], "db_unavailable");
    }
}

//! Layer routes
//!
//! Public read-only route for listing layers and their feature counts.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use super::queries::{list_layers, ListLayersQuery};

/// Create layer routes
pub fn layers_routes() -> Router<PgPool> {
    Router::new().route("/", get(list_layers_handler))
}

/// List all layers with feature counts
///
/// GET /layers
async fn list_layers_handler(State(db): State<PgPool>) -> Result<Response, StatusCode> {
    match list_layers::handle(&db, ListLayersQuery::default()).await {
        Ok(response) => Ok((StatusCode::OK, Json(response)).into_response()),
        Err(e) => {
            tracing::error!("Failed to list layers: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_layers_routes_exist() {
        let _router = layers_routes();
    }
}

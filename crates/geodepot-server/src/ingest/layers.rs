//! Layer registry
//!
//! Layers are created lazily on first ingestion and never deleted by the
//! pipeline. Names are normalized before storage so that "Pop Density",
//! "pop-density", and "POP_DENSITY" all resolve to the same row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Normalize a layer name for storage and lookup
///
/// Lowercases, collapses every run of non-alphanumeric characters to a
/// single `_`, and trims leading/trailing separators.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Idempotently create or look up a layer, returning its id
///
/// A conflict on the normalized name means the layer already exists; the
/// existing row wins and its title is never overwritten. The insert-then-
/// select dance resolves concurrent creation races to the single surviving
/// row.
pub async fn upsert(
    pool: &PgPool,
    name: &str,
    title: Option<&str>,
    srid: i32,
) -> Result<i64, sqlx::Error> {
    let key = normalize_name(name);

    sqlx::query(
        r#"
        INSERT INTO layers (name, title, srid)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(&key)
    .bind(title.unwrap_or(name))
    .bind(srid)
    .execute(pool)
    .await?;

    // Fetch the id in case another job created the row concurrently.
    sqlx::query_scalar::<_, i64>("SELECT id FROM layers WHERE name = $1")
        .bind(&key)
        .fetch_one(pool)
        .await
}

/// One row of the layer listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LayerSummary {
    pub name: String,
    pub title: Option<String>,
    pub geometry_kind: Option<String>,
    pub srid: Option<i32>,
    pub feature_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of a layer listing, with an advisory note when the store was
/// unreachable and an empty list was substituted
#[derive(Debug, Clone)]
pub struct LayerListing {
    pub layers: Vec<LayerSummary>,
    pub note: Option<&'static str>,
}

/// List layers with their feature counts
///
/// Transient connectivity failures degrade to an empty listing with a
/// `db_unavailable` note instead of a hard error, so a polling UI keeps
/// working through a store hiccup.
pub async fn list(pool: &PgPool) -> Result<LayerListing, sqlx::Error> {
    let result = sqlx::query_as::<_, LayerSummary>(
        r#"
        SELECT l.name, l.title, l.geometry_kind, l.srid,
               COALESCE(cnt.count, 0) AS feature_count,
               l.created_at
        FROM layers l
        LEFT JOIN (
            SELECT layer_id, COUNT(*) AS count
            FROM features
            GROUP BY layer_id
        ) cnt ON cnt.layer_id = l.id
        ORDER BY l.title NULLS LAST, l.name
        "#,
    )
    .fetch_all(pool)
    .await;

    match result {
        Ok(layers) => Ok(LayerListing {
            layers,
            note: None,
        }),
        Err(err) if is_transient(&err) => {
            tracing::warn!(error = %err, "Layer listing degraded: store unreachable");
            Ok(LayerListing {
                layers: Vec::new(),
                note: Some("db_unavailable"),
            })
        },
        Err(err) => Err(err),
    }
}

/// Whether an error looks like a transient connectivity problem rather than
/// a real query failure
pub(crate) fn is_transient(err: &sqlx::Error) -> bool {
    if matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Tls(_)
    ) {
        return true;
    }

    let text = err.to_string().to_lowercase();
    ["connection", "timeout", "closed", "terminating connection", "cannot connect"]
        .iter()
        .any(|needle| text.contains(needle))
}

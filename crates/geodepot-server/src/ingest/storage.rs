//! Two-tier feature inserts
//!
//! The fast path loads a whole batch with one multi-row insert inside one
//! transaction. When that fails (typically one bad geometry poisoning the
//! batch), the fallback replays the batch row by row under savepoints,
//! skipping bad records and bounding transaction size by committing every
//! few successful rows.
//!
//! Geometries are parsed, SRID-stamped, and reprojected in the database:
//! `ST_GeomFromGeoJSON` + `ST_SetSRID`, with `ST_Transform` applied only
//! when the declared source SRID differs from the canonical one.

use serde::Serialize;
use serde_json::Value;
use sqlx::{Acquire, PgPool};

/// Canonical geographic reference every stored geometry is expressed in
pub const CANONICAL_SRID: i32 = 4326;

/// One feature staged for insert: geometry and properties as JSON text,
/// expanded server-side by `jsonb_to_recordset`
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    pub geom: String,
    pub props: String,
}

impl FeatureRow {
    pub fn new(geometry: &Value, properties: &Value) -> Self {
        Self {
            geom: geometry.to_string(),
            props: properties.to_string(),
        }
    }
}

const BATCH_INSERT_SQL: &str = r#"
    INSERT INTO features (layer_id, properties, geom)
    SELECT $1,
           CAST(v.props AS jsonb),
           CASE
             WHEN $2 = 4326 THEN ST_SetSRID(ST_GeomFromGeoJSON(v.geom), 4326)
             ELSE ST_Transform(ST_SetSRID(ST_GeomFromGeoJSON(v.geom), $2), 4326)
           END
    FROM jsonb_to_recordset($3) AS v(geom text, props text)
"#;

const ROW_INSERT_SQL: &str = r#"
    INSERT INTO features (layer_id, properties, geom)
    VALUES (
        $1,
        CAST($2 AS jsonb),
        CASE
          WHEN $3 = 4326 THEN ST_SetSRID(ST_GeomFromGeoJSON($4), 4326)
          ELSE ST_Transform(ST_SetSRID(ST_GeomFromGeoJSON($4), $3), 4326)
        END
    )
"#;

/// Insert a whole batch atomically
///
/// The batch either lands in full or the error propagates for the caller to
/// degrade to [`flush_rows`]. No partial effect survives a failure.
pub async fn flush_batch(
    pool: &PgPool,
    layer_id: i64,
    srid: i32,
    batch: &[FeatureRow],
) -> Result<(), sqlx::Error> {
    if batch.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    sqlx::query(BATCH_INSERT_SQL)
        .bind(layer_id)
        .bind(srid)
        .bind(sqlx::types::Json(batch))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Replay a failed batch one row at a time, skipping bad records
///
/// Each row runs under a savepoint so a bad geometry cannot poison the
/// enclosing transaction, and the transaction is committed every
/// `commit_every` successful rows to keep it small. Per-row failures are
/// reported through `on_error` and skipped; only connection-level failures
/// propagate. Returns how many rows were actually persisted.
pub async fn flush_rows<F>(
    pool: &PgPool,
    layer_id: i64,
    srid: i32,
    batch: &[FeatureRow],
    commit_every: usize,
    mut on_error: F,
) -> Result<usize, sqlx::Error>
where
    F: FnMut(&sqlx::Error),
{
    let mut inserted = 0usize;
    let mut tx = pool.begin().await?;

    for row in batch {
        let mut savepoint = tx.begin().await?;

        let result = sqlx::query(ROW_INSERT_SQL)
            .bind(layer_id)
            .bind(&row.props)
            .bind(srid)
            .bind(&row.geom)
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(_) => {
                savepoint.commit().await?;
                inserted += 1;

                if commit_every > 0 && inserted % commit_every == 0 {
                    tx.commit().await?;
                    tx = pool.begin().await?;
                }
            },
            Err(err) => {
                savepoint.rollback().await?;
                tracing::warn!(layer_id, error = %err, "Row insert failed, skipping record");
                on_error(&err);
            },
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

//! End-to-end pipeline tests covering the documented import scenarios.
//!
//! These tests need a PostgreSQL database with PostGIS available via
//! `DATABASE_URL` and are ignored by default:
//!
//! ```sh
//! DATABASE_URL=postgresql://localhost/geodepot_test cargo test -- --ignored
//! ```

use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use geodepot_server::ingest::jobs::{self, JobStatus};
use geodepot_server::ingest::layers;
use geodepot_server::ingest::spool::SpooledUpload;
use geodepot_server::ingest::{ImportPipeline, ImportTask, IngestConfig};

async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/geodepot_test".to_string());
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn point_feature(i: usize) -> Value {
    json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [i as f64 / 100.0, i as f64 / 100.0]},
        "properties": {"index": i}
    })
}

fn collection(features: Vec<Value>) -> Vec<u8> {
    json!({"type": "FeatureCollection", "features": features})
        .to_string()
        .into_bytes()
}

struct Harness {
    pool: PgPool,
    config: IngestConfig,
    spool_dir: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        let spool_dir = tempfile::tempdir().unwrap();
        let config = IngestConfig {
            spool_dir: spool_dir.path().to_path_buf(),
            ..IngestConfig::default()
        };
        Self {
            pool: test_pool().await,
            config,
            spool_dir,
        }
    }

    /// Spool a payload, create a queued job, and run the pipeline on it.
    async fn run_import(&self, layer_name: &str, payload: &[u8]) -> (i64, std::path::PathBuf) {
        let upload = SpooledUpload::acquire(self.spool_dir.path(), "upload.geojson", payload)
            .await
            .unwrap();
        let spooled_path = upload.path().to_path_buf();

        let job_id = jobs::create(&self.pool, layer_name, &spooled_path.to_string_lossy())
            .await
            .unwrap();

        let pipeline = ImportPipeline::new(self.pool.clone(), self.config.clone());
        pipeline
            .run(ImportTask {
                job_id,
                layer_name: layer_name.to_string(),
                srid: 4326,
                upload,
            })
            .await;

        (job_id, spooled_path)
    }

    async fn feature_count(&self, layer_name: &str) -> i64 {
        let layer_id = layers::upsert(&self.pool, layer_name, None, 4326).await.unwrap();
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM features WHERE layer_id = $1")
            .bind(layer_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "requires a PostGIS DATABASE_URL"]
async fn scenario_a_clean_collection_completes_with_three_flushes() {
    let harness = Harness::new().await;
    let layer = unique("Scenario A");

    let payload = collection((0..120).map(point_feature).collect());
    let (job_id, spooled_path) = harness.run_import(&layer, &payload).await;

    let job = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(job.job_status(), JobStatus::Completed);
    assert_eq!(job.total, Some(120));
    assert_eq!(job.processed, 120);
    assert_eq!(job.errors, 0);
    assert_eq!(
        job.message.as_deref(),
        Some("Completed. Inserted 120/120. Errors: 0.")
    );

    assert_eq!(harness.feature_count(&layer).await, 120);
    assert!(!spooled_path.exists(), "spooled upload must be released");
}

#[tokio::test]
#[ignore = "requires a PostGIS DATABASE_URL"]
async fn scenario_b_missing_geometry_is_counted_not_persisted() {
    let harness = Harness::new().await;
    let layer = unique("Scenario B");

    let mut features: Vec<Value> = (0..9).map(point_feature).collect();
    features.insert(4, json!({"type": "Feature", "properties": {"name": "no geometry"}}));

    let (job_id, _) = harness.run_import(&layer, &collection(features)).await;

    let job = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(job.job_status(), JobStatus::Completed);
    assert_eq!(job.total, Some(10));
    assert_eq!(job.processed, 9);
    assert_eq!(job.errors, 1);

    assert_eq!(harness.feature_count(&layer).await, 9);
}

#[tokio::test]
#[ignore = "requires a PostGIS DATABASE_URL"]
async fn scenario_c_bad_geometries_degrade_to_row_fallback() {
    let harness = Harness::new().await;
    let layer = unique("Scenario C");

    // 50 features, 2 structurally invalid: the bulk flush fails and the
    // row fallback inserts the other 48.
    let mut features: Vec<Value> = (0..48).map(point_feature).collect();
    let invalid = json!({
        "type": "Feature",
        "geometry": {"type": "Point"},
        "properties": {}
    });
    features.insert(7, invalid.clone());
    features.insert(23, invalid);

    let (job_id, _) = harness.run_import(&layer, &collection(features)).await;

    let job = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(job.job_status(), JobStatus::Completed);
    assert_eq!(job.total, Some(50));
    assert_eq!(job.processed, 48);
    assert_eq!(job.errors, 2);

    let message = job.message.unwrap();
    assert!(message.starts_with("Completed. Inserted 48/50. Errors: 2."), "{}", message);
    assert!(message.contains("Samples:"), "{}", message);

    assert_eq!(harness.feature_count(&layer).await, 48);
}

#[tokio::test]
#[ignore = "requires a PostGIS DATABASE_URL"]
async fn scenario_d_malformed_upload_fails_without_partial_ingestion() {
    let harness = Harness::new().await;
    let layer = unique("Scenario D");

    let (job_id, spooled_path) = harness.run_import(&layer, b"this is not json").await;

    let job = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(job.job_status(), JobStatus::Failed);
    assert_eq!(job.total, None);
    assert_eq!(job.processed, 0);
    assert_eq!(job.errors, 0);
    assert!(job.message.unwrap().contains("Parse error"));

    assert!(!spooled_path.exists(), "spooled upload must be released on failure");
}

#[tokio::test]
#[ignore = "requires a PostGIS DATABASE_URL"]
async fn non_collection_payload_fails_the_job() {
    let harness = Harness::new().await;
    let layer = unique("Non Collection");

    let (job_id, _) = harness
        .run_import(&layer, br#"{"type": "Feature", "geometry": null}"#)
        .await;

    let job = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(job.job_status(), JobStatus::Failed);
    assert!(job.message.unwrap().contains("feature collection"));
}

#[tokio::test]
#[ignore = "requires a PostGIS DATABASE_URL"]
async fn rerunning_a_finished_job_is_a_no_op() {
    let harness = Harness::new().await;
    let layer = unique("Rerun");

    let payload = collection((0..3).map(point_feature).collect());
    let (job_id, _) = harness.run_import(&layer, &payload).await;

    let before = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(before.job_status(), JobStatus::Completed);

    // A second run against the same job id must not claim or mutate it.
    let upload = SpooledUpload::acquire(harness.spool_dir.path(), "again.geojson", &payload)
        .await
        .unwrap();
    let pipeline = ImportPipeline::new(harness.pool.clone(), harness.config.clone());
    pipeline
        .run(ImportTask {
            job_id,
            layer_name: layer.clone(),
            srid: 4326,
            upload,
        })
        .await;

    let after = jobs::get(&harness.pool, job_id).await.unwrap();
    assert_eq!(after.processed, before.processed);
    assert_eq!(after.message, before.message);
    assert_eq!(harness.feature_count(&layer).await, 3);
}

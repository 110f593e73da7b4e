//! Geodepot Server - Main entry point

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use geodepot_common::logging::{init_logging, LogConfig};
use serde_json::json;
use sqlx::PgPool;
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::info;

use geodepot_server::{
    config::Config,
    db, features,
    ingest::{ImportQueue, ImportWorker, IngestConfig},
    middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("geodepot-server".to_string())
        .filter_directives("geodepot_server=debug,tower_http=debug,axum=trace,sqlx=info".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Geodepot Server");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    // Initialize database connection pool
    let db_pool = db::create_pool(&config.database).await?;

    // Run migrations; everything downstream assumes the schema exists
    db::run_migrations(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    // Start the import queue and background workers
    let ingest_config = IngestConfig::from_env();
    let (queue, rx) = ImportQueue::new(ingest_config.queue_depth);
    let worker_handles = ImportWorker::new(db_pool.clone(), ingest_config.clone()).spawn(rx);
    info!(workers = worker_handles.len(), "Import workers started");

    // Create feature state
    let feature_state = features::FeatureState {
        db: db_pool.clone(),
        queue,
        ingest: ingest_config,
    };

    // Build the application router
    let app = create_router(db_pool, feature_state, &config);

    // Create socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(db: PgPool, feature_state: features::FeatureState, config: &Config) -> Router {
    let feature_routes = features::router(feature_state);

    Router::new()
        .route("/health", get(health_check))
        .with_state(db)
        .nest("/api/v1", feature_routes)
        // tower-http's `Cors` requires its inner service's response body to
        // implement `Default` (it emits an empty body for preflight/rejected
        // requests). Only the raw route body satisfies that — the compression
        // and trace bodies do not — so CORS must wrap the route directly.
        .layer(
            ServiceBuilder::new()
                .layer(middleware::tracing_layer())
                .layer(CompressionLayer::new())
                .layer(middleware::cors_layer(&config.cors)),
        )
}

/// Health check handler
async fn health_check(State(db): State<PgPool>) -> Result<Response, StatusCode> {
    match db::health_check(&db).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}

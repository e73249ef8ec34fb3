/// Server setup and initialization
///
/// Wires together storage and HTTP routes. Provides the application factory
/// used by `main` and by the integration tests.

use crate::{
    api::{create_api_routes, ApiError, AppState},
    config::Config,
    storage::{Database, ProcessStore},
};
use anyhow::Result;
use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Create the application on the on-disk database from `config`
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📁 Using data directory: {}", config.database.data_dir);
    let database = Database::connect(&config.database.data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    let app = create_router(database);
    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Router over an already opened database
pub fn create_router(database: Database) -> Router {
    let state = AppState {
        store: ProcessStore::new(&database),
    };

    tracing::info!("📡 Creating HTTP router with all endpoints");
    Router::new()
        .route("/api/health", get(health_check))
        .merge(create_api_routes())
        .fallback(not_found)
        .with_state(state)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting ProcessFlow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);
    tracing::info!("Health check: http://{}/api/health", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "ProcessFlow API is running" }))
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Endpoint not found")
}

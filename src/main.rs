/// ProcessFlow: process diagramming backend
///
/// Main entry point. Loads configuration from the environment and starts
/// the HTTP server:
/// - Workspace/process API at /api/workspaces/*
/// - Diagram content API at /api/processes/*
/// - Health check at /api/health

use processflow::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}

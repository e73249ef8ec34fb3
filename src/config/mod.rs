/// Configuration management for ProcessFlow
///
/// Handles server configuration, database location, API client settings and
/// editor behaviour.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Remote API client configuration (editor side)
    pub client: ClientConfig,
    /// Diagram editor behaviour
    pub editor: EditorConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// SQLite storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding processflow.db (default: "data")
    pub data_dir: String,
}

/// Settings for the API client used by the editor to persist changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL including the /api prefix (e.g., "http://localhost:3001/api")
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Diagram editor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// When true, auto-layout only repositions elements and leaves the
    /// connections alone instead of rebuilding them as a linear chain
    pub keep_connections_on_layout: bool,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("PROCESSFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("PROCESSFLOW_PORT")
                    .unwrap_or_else(|_| "3001".to_string())
                    .parse()
                    .unwrap_or(3001),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("PROCESSFLOW_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
            },
            client: ClientConfig {
                api_base_url: std::env::var("PROCESSFLOW_API_URL")
                    .unwrap_or_else(|_| "http://localhost:3001/api".to_string()),
                request_timeout_secs: std::env::var("PROCESSFLOW_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            },
            editor: EditorConfig {
                keep_connections_on_layout: std::env::var("PROCESSFLOW_LAYOUT_KEEP_CONNECTIONS")
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
        }
    }
}

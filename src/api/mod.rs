/// HTTP API Layer
///
/// REST endpoints over the process store. It handles:
/// - Workspace and process listing/creation
/// - Element and connection CRUD within a process
/// - Uniform `{"error": "..."}` bodies for every failure

use crate::error::StoreError;
use crate::storage::ProcessStore;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use serde_json::json;

// Workspace and process metadata endpoints
pub mod workspaces;

// Diagram content endpoints (elements, connections)
pub mod processes;

pub use processes::create_process_routes;
pub use workspaces::create_workspace_routes;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// SQLite-backed process storage
    pub store: ProcessStore,
}

/// All /api routes
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .merge(create_workspace_routes())
        .merge(create_process_routes())
}

/// Failure response rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Map a storage failure; unexpected errors are logged and hidden
    pub fn from_store(context: &str, error: anyhow::Error) -> Self {
        match error.downcast_ref::<StoreError>() {
            Some(StoreError::NotFound(message)) => Self::new(StatusCode::NOT_FOUND, message.clone()),
            Some(StoreError::Invalid(message)) => Self::new(StatusCode::BAD_REQUEST, message.clone()),
            Some(StoreError::Conflict(message)) => Self::new(StatusCode::CONFLICT, message.clone()),
            None => {
                tracing::error!("❌ {} failed: {:#}", context, error);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

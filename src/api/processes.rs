/// Diagram content endpoints
///
/// Elements and connections of one process. Request bodies are camelCase;
/// rows come back as stored (snake_case, properties as JSON text).

use crate::api::{ApiError, ApiResult, AppState};
use crate::process::records::{
    ConnectionResponse, CreateConnectionRequest, CreateElementRequest, ElementResponse,
    ProcessDetail, UpdateElementRequest,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};

pub fn create_process_routes() -> Router<AppState> {
    Router::new()
        .route("/api/processes/{id}", get(get_process))
        .route("/api/processes/{id}/elements", post(create_element))
        .route("/api/processes/{id}/elements/{element_id}", put(update_element))
        .route("/api/processes/{id}/elements/{element_id}", delete(delete_element))
        .route("/api/processes/{id}/connections", post(create_connection))
        .route(
            "/api/processes/{id}/connections/{connection_id}",
            delete(delete_connection),
        )
}

/// GET /api/processes/{id}
/// Returns: { "process": {...}, "elements": [...], "connections": [...] }
async fn get_process(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ProcessDetail>> {
    match state.store.process_detail(id).await {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(ApiError::not_found(format!("Process {} not found", id))),
        Err(e) => Err(ApiError::from_store("get_process", e)),
    }
}

/// POST /api/processes/{id}/elements
/// Body: { "elementType": "step", "label": "...", "xPosition": 0, "yPosition": 0, "properties": "{}" }
async fn create_element(
    State(state): State<AppState>,
    Path(process_id): Path<i64>,
    payload: Result<Json<CreateElementRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ElementResponse>)> {
    let Json(request) = payload?;
    let element = state
        .store
        .create_element(process_id, &request)
        .await
        .map_err(|e| ApiError::from_store("create_element", e))?;

    tracing::info!("🧩 Element {} added to process {}", element.id, process_id);

    Ok((
        StatusCode::CREATED,
        Json(ElementResponse {
            message: "Element created".to_string(),
            element,
        }),
    ))
}

/// PUT /api/processes/{id}/elements/{element_id}
/// Body: any subset of the create fields
async fn update_element(
    State(state): State<AppState>,
    Path((process_id, element_id)): Path<(i64, i64)>,
    payload: Result<Json<UpdateElementRequest>, JsonRejection>,
) -> ApiResult<Json<ElementResponse>> {
    let Json(request) = payload?;
    let element = state
        .store
        .update_element(process_id, element_id, &request)
        .await
        .map_err(|e| ApiError::from_store("update_element", e))?;

    Ok(Json(ElementResponse {
        message: "Element updated".to_string(),
        element,
    }))
}

/// DELETE /api/processes/{id}/elements/{element_id}
/// Connections touching the element are deleted with it.
async fn delete_element(
    State(state): State<AppState>,
    Path((process_id, element_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    let removed = state
        .store
        .delete_element(process_id, element_id)
        .await
        .map_err(|e| ApiError::from_store("delete_element", e))?;

    tracing::info!(
        "🗑️ Element {} deleted from process {} ({} connections)",
        element_id,
        process_id,
        removed
    );

    Ok(Json(json!({
        "message": "Element deleted",
        "removedConnections": removed,
    })))
}

/// POST /api/processes/{id}/connections
/// Body: { "sourceElementId": 1, "targetElementId": 2, "label": "..." }
async fn create_connection(
    State(state): State<AppState>,
    Path(process_id): Path<i64>,
    payload: Result<Json<CreateConnectionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ConnectionResponse>)> {
    let Json(request) = payload?;
    let connection = state
        .store
        .create_connection(process_id, &request)
        .await
        .map_err(|e| ApiError::from_store("create_connection", e))?;

    tracing::info!(
        "🔗 Connection {} ({} -> {}) added to process {}",
        connection.id,
        connection.source_element_id,
        connection.target_element_id,
        process_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ConnectionResponse {
            message: "Connection created".to_string(),
            connection,
        }),
    ))
}

/// DELETE /api/processes/{id}/connections/{connection_id}
async fn delete_connection(
    State(state): State<AppState>,
    Path((process_id, connection_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .delete_connection(process_id, connection_id)
        .await
        .map_err(|e| ApiError::from_store("delete_connection", e))?;

    Ok(Json(json!({ "message": "Connection deleted" })))
}

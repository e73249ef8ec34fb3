/// Workspace and process metadata endpoints
///
/// Workspaces group processes; a process row carries name, description and
/// status. Diagram content lives under /api/processes (see `processes`).

use crate::api::{ApiError, ApiResult, AppState};
use crate::process::records::{
    CreateProcessRequest, CreateWorkspaceRequest, ProcessList, ProcessResponse, WorkspaceList,
    WorkspaceResponse,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

pub fn create_workspace_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workspaces", get(list_workspaces).post(create_workspace))
        .route("/api/workspaces/{id}", get(get_workspace))
        .route(
            "/api/workspaces/{id}/processes",
            get(list_processes).post(create_process),
        )
}

/// GET /api/workspaces
/// Returns: { "workspaces": [...] }
async fn list_workspaces(State(state): State<AppState>) -> ApiResult<Json<WorkspaceList>> {
    let workspaces = state
        .store
        .list_workspaces()
        .await
        .map_err(|e| ApiError::from_store("list_workspaces", e))?;
    Ok(Json(WorkspaceList { workspaces }))
}

/// POST /api/workspaces
/// Body: { "name": "...", "description": "..." }
async fn create_workspace(
    State(state): State<AppState>,
    payload: Result<Json<CreateWorkspaceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WorkspaceResponse>)> {
    let Json(request) = payload?;
    let workspace = state
        .store
        .create_workspace(&request)
        .await
        .map_err(|e| ApiError::from_store("create_workspace", e))?;

    Ok((
        StatusCode::CREATED,
        Json(WorkspaceResponse {
            message: Some(format!("Workspace '{}' created", workspace.name)),
            workspace,
        }),
    ))
}

/// GET /api/workspaces/{id}
async fn get_workspace(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<WorkspaceResponse>> {
    match state.store.get_workspace(id).await {
        Ok(Some(workspace)) => Ok(Json(WorkspaceResponse {
            message: None,
            workspace,
        })),
        Ok(None) => Err(ApiError::not_found(format!("Workspace {} not found", id))),
        Err(e) => Err(ApiError::from_store("get_workspace", e)),
    }
}

/// GET /api/workspaces/{id}/processes
/// Returns: { "processes": [...] }, most recently changed first
async fn list_processes(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
) -> ApiResult<Json<ProcessList>> {
    match state.store.get_workspace(workspace_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ApiError::not_found(format!("Workspace {} not found", workspace_id))),
        Err(e) => return Err(ApiError::from_store("list_processes", e)),
    }

    let processes = state
        .store
        .list_processes(workspace_id)
        .await
        .map_err(|e| ApiError::from_store("list_processes", e))?;
    Ok(Json(ProcessList { processes }))
}

/// POST /api/workspaces/{id}/processes
/// Body: { "name": "...", "description": "...", "status": "draft" }
async fn create_process(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
    payload: Result<Json<CreateProcessRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProcessResponse>)> {
    let Json(request) = payload?;
    let process = state
        .store
        .create_process(workspace_id, &request)
        .await
        .map_err(|e| ApiError::from_store("create_process", e))?;

    Ok((
        StatusCode::CREATED,
        Json(ProcessResponse {
            message: format!("Process '{}' created", process.name),
            process,
        }),
    ))
}

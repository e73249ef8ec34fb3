//! Shared helpers for the HTTP and sync integration tests.
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use processflow::config::ClientConfig;
use processflow::server::create_router;
use processflow::storage::Database;
use processflow::sync::{ApiClient, ErrorLog, ErrorSink, Session};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a fresh in-memory database.
#[allow(dead_code)]
pub async fn test_app() -> Router {
    let database = Database::in_memory().await.unwrap();
    create_router(database)
}

/// Sends one request and returns the status and the JSON body
/// (`Value::Null` when the body is empty or not JSON).
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Creates a workspace and a process in it, returning the process id.
#[allow(dead_code)]
pub async fn seed_process(app: &Router) -> i64 {
    let (status, body) = send(app, "POST", "/api/workspaces", Some(json!({ "name": "Operations" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let workspace_id = body["workspace"]["id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        "POST",
        &format!("/api/workspaces/{}/processes", workspace_id),
        Some(json!({ "name": "Invoice approval" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["process"]["id"].as_i64().unwrap()
}

/// Client pointed at a mock server, with the log it reports into.
#[allow(dead_code)]
pub fn client_for(server_uri: &str) -> (Arc<ApiClient>, Arc<ErrorLog>, Arc<dyn ErrorSink>, Arc<Session>) {
    let session = Arc::new(Session::new(Some("test-token".to_string())));
    let config = ClientConfig {
        api_base_url: format!("{}/api", server_uri),
        request_timeout_secs: 5,
    };
    let client = Arc::new(ApiClient::new(&config, Arc::clone(&session)).unwrap());
    let log = Arc::new(ErrorLog::with_session(Arc::clone(&session)));
    let sink: Arc<dyn ErrorSink> = log.clone();
    (client, log, sink, session)
}

/// Body of a successful element create/update response.
#[allow(dead_code)]
pub fn element_response(id: i64, process_id: i64, label: &str, x: f64, y: f64) -> Value {
    json!({
        "message": "Element created",
        "element": {
            "id": id,
            "process_id": process_id,
            "element_type": "step",
            "label": label,
            "x_position": x,
            "y_position": y,
            "properties": "{}"
        }
    })
}

/// Body of a successful connection create response.
#[allow(dead_code)]
pub fn connection_response(id: i64, process_id: i64, source: i64, target: i64) -> Value {
    json!({
        "message": "Connection created",
        "connection": {
            "id": id,
            "process_id": process_id,
            "source_element_id": source,
            "target_element_id": target,
            "label": null,
            "properties": "{}"
        }
    })
}

mod common;

use axum::http::StatusCode;
use common::{seed_process, send, test_app};
use serde_json::json;

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn unknown_endpoint_returns_error_body() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/nothing-here", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn workspace_and_process_lifecycle() {
    let app = test_app().await;

    let (status, body) = send(&app, "POST", "/api/workspaces", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let process_id = seed_process(&app).await;

    let (status, body) = send(&app, "GET", "/api/workspaces", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workspaces"].as_array().unwrap().len(), 1);
    let workspace_id = body["workspaces"][0]["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/workspaces/{}/processes", workspace_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processes"][0]["id"].as_i64(), Some(process_id));
    assert_eq!(body["processes"][0]["status"], "draft");

    let (status, body) = send(&app, "GET", &format!("/api/processes/{}", process_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["process"]["name"], "Invoice approval");
    assert_eq!(body["elements"], json!([]));
    assert_eq!(body["connections"], json!([]));

    let (status, _) = send(&app, "GET", "/api/workspaces/999/processes", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn element_crud_uses_camel_case_bodies() {
    let app = test_app().await;
    let process_id = seed_process(&app).await;
    let elements = format!("/api/processes/{}/elements", process_id);

    let (status, body) = send(
        &app,
        "POST",
        &elements,
        Some(json!({
            "elementType": "decision",
            "label": "Amount > 1000?",
            "xPosition": 120.0,
            "yPosition": 80.0,
            "properties": "{\"description\":\"threshold check\"}"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let element = &body["element"];
    assert_eq!(element["element_type"], "decision");
    assert_eq!(element["x_position"], 120.0);
    let element_id = element["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{}/{}", elements, element_id),
        Some(json!({ "label": "Amount > 5000?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["element"]["label"], "Amount > 5000?");
    assert_eq!(body["element"]["x_position"], 120.0);
    assert_eq!(body["element"]["properties"], "{\"description\":\"threshold check\"}");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{}/{}", elements, element_id + 100),
        Some(json!({ "label": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = test_app().await;
    let process_id = seed_process(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/processes/{}/elements", process_id),
        Some(json!({ "label": "no type" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn connections_follow_the_linking_rules() {
    let app = test_app().await;
    let process_id = seed_process(&app).await;
    let base = format!("/api/processes/{}", process_id);

    let mut ids = Vec::new();
    for label in ["Receive", "Approve", "Pay"] {
        let (_, body) = send(
            &app,
            "POST",
            &format!("{}/elements", base),
            Some(json!({ "elementType": "step", "label": label })),
        )
        .await;
        ids.push(body["element"]["id"].as_i64().unwrap());
    }

    let link = |source: i64, target: i64| json!({ "sourceElementId": source, "targetElementId": target });
    let connections = format!("{}/connections", base);

    let (status, body) = send(&app, "POST", &connections, Some(link(ids[0], ids[1]))).await;
    assert_eq!(status, StatusCode::CREATED);
    let first_connection = body["connection"]["id"].as_i64().unwrap();
    assert_eq!(body["connection"]["source_element_id"].as_i64(), Some(ids[0]));

    let (status, body) = send(&app, "POST", &connections, Some(link(ids[1], ids[0]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "POST", &connections, Some(link(ids[2], ids[2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", &connections, Some(link(ids[1], ids[2]))).await;
    assert_eq!(status, StatusCode::CREATED);

    // Deleting the middle element takes both of its connections along
    let (status, body) = send(&app, "DELETE", &format!("{}/elements/{}", base, ids[1]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removedConnections"], 2);

    let (_, body) = send(&app, "GET", &base, None).await;
    assert_eq!(body["elements"].as_array().unwrap().len(), 2);
    assert_eq!(body["connections"], json!([]));

    let (status, _) = send(&app, "DELETE", &format!("{}/{}", connections, first_connection), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_process_is_not_found() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/api/processes/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Process 42 not found");

    let (status, _) = send(
        &app,
        "POST",
        "/api/processes/42/elements",
        Some(json!({ "elementType": "step", "label": "orphan" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

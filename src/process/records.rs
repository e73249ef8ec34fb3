/// Storage rows and API payloads
///
/// These are the shapes exchanged across the REST boundary. Rows come back
/// snake_case exactly as stored (properties as JSON text); request bodies
/// are camelCase.

use crate::process::types::{Connection, Element, Properties};
use serde::{Deserialize, Serialize};

/// A workspace row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkspaceRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// Process metadata row (name, description, status)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessRecord {
    pub id: i64,
    pub workspace_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored diagram element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ElementRecord {
    pub id: i64,
    pub process_id: i64,
    pub element_type: String,
    pub label: String,
    #[serde(default)]
    pub x_position: Option<f64>,
    #[serde(default)]
    pub y_position: Option<f64>,
    /// Serialized properties; may be missing or malformed
    #[serde(default)]
    pub properties: Option<String>,
}

/// A stored connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConnectionRecord {
    pub id: i64,
    pub process_id: i64,
    pub source_element_id: i64,
    pub target_element_id: i64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Option<String>,
}

/// Response of GET /api/processes/{id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDetail {
    pub process: ProcessRecord,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProcessRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of POST /api/processes/{id}/elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElementRequest {
    pub element_type: String,
    pub label: String,
    #[serde(default)]
    pub x_position: Option<f64>,
    #[serde(default)]
    pub y_position: Option<f64>,
    /// Properties already serialized to JSON text by the caller
    #[serde(default)]
    pub properties: Option<String>,
}

impl CreateElementRequest {
    pub fn from_element(element: &Element) -> Self {
        Self {
            element_type: element.element_type.to_string(),
            label: element.label.clone(),
            x_position: Some(element.position.x),
            y_position: Some(element.position.y),
            properties: Some(element.properties.to_json_text()),
        }
    }
}

/// Body of PUT /api/processes/{id}/elements/{element_id}
///
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElementRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

impl UpdateElementRequest {
    /// Best-known full state of the element
    pub fn full_state(element: &Element) -> Self {
        Self {
            element_type: Some(element.element_type.to_string()),
            label: Some(element.label.clone()),
            x_position: Some(element.position.x),
            y_position: Some(element.position.y),
            properties: Some(element.properties.to_json_text()),
        }
    }
}

/// Body of POST /api/processes/{id}/connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    pub source_element_id: i64,
    pub target_element_id: i64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Option<String>,
}

impl CreateConnectionRequest {
    /// Request for `connection`, or `None` while an endpoint only has a local id
    pub fn from_connection(connection: &Connection) -> Option<Self> {
        Some(Self {
            source_element_id: connection.source.remote_id()?,
            target_element_id: connection.target.remote_id()?,
            label: connection.label.clone(),
            properties: Some(connection.properties.to_json_text()),
        })
    }
}

/// Envelope of element create/update responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementResponse {
    pub message: String,
    pub element: ElementRecord,
}

/// Envelope of connection create responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub message: String,
    pub connection: ConnectionRecord,
}

/// Envelope of GET /api/workspaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceList {
    pub workspaces: Vec<WorkspaceRecord>,
}

/// Envelope of workspace create/get responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub workspace: WorkspaceRecord,
}

/// Envelope of GET /api/workspaces/{id}/processes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessList {
    pub processes: Vec<ProcessRecord>,
}

/// Envelope of process create responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub message: String,
    pub process: ProcessRecord,
}

/// Parsed form of a stored properties column
pub fn parse_properties(raw: &Option<String>) -> Properties {
    Properties::parse_lenient(raw.as_deref())
}

/// HTTP client for the process persistence API
///
/// Thin typed wrapper over reqwest. Every call attaches the session's bearer
/// token and maps non-success responses to `RemoteError::Status`, carrying
/// the `error` field of the body when the server sent one.

use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::process::records::{
    ConnectionRecord, ConnectionResponse, CreateConnectionRequest, CreateElementRequest,
    CreateProcessRequest, CreateWorkspaceRequest, ElementRecord, ElementResponse, ProcessDetail,
    ProcessList, ProcessRecord, ProcessResponse, UpdateElementRequest, WorkspaceList,
    WorkspaceRecord, WorkspaceResponse,
};
use crate::sync::session::Session;
use anyhow::Result;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn health(&self) -> Result<HealthStatus, RemoteError> {
        self.send(self.client.get(self.url("/health"))).await
    }

    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceRecord>, RemoteError> {
        let list: WorkspaceList = self.send(self.client.get(self.url("/workspaces"))).await?;
        Ok(list.workspaces)
    }

    pub async fn create_workspace(&self, request: &CreateWorkspaceRequest) -> Result<WorkspaceRecord, RemoteError> {
        let response: WorkspaceResponse = self.send(self.client.post(self.url("/workspaces")).json(request)).await?;
        Ok(response.workspace)
    }

    pub async fn list_processes(&self, workspace_id: i64) -> Result<Vec<ProcessRecord>, RemoteError> {
        let path = format!("/workspaces/{}/processes", workspace_id);
        let list: ProcessList = self.send(self.client.get(self.url(&path))).await?;
        Ok(list.processes)
    }

    pub async fn create_process(
        &self,
        workspace_id: i64,
        request: &CreateProcessRequest,
    ) -> Result<ProcessRecord, RemoteError> {
        let path = format!("/workspaces/{}/processes", workspace_id);
        let response: ProcessResponse = self.send(self.client.post(self.url(&path)).json(request)).await?;
        Ok(response.process)
    }

    /// Process with all of its elements and connections
    pub async fn fetch_process(&self, process_id: i64) -> Result<ProcessDetail, RemoteError> {
        let path = format!("/processes/{}", process_id);
        self.send(self.client.get(self.url(&path))).await
    }

    pub async fn create_element(
        &self,
        process_id: i64,
        request: &CreateElementRequest,
    ) -> Result<ElementRecord, RemoteError> {
        let path = format!("/processes/{}/elements", process_id);
        let response: ElementResponse = self.send(self.client.post(self.url(&path)).json(request)).await?;
        Ok(response.element)
    }

    pub async fn update_element(
        &self,
        process_id: i64,
        element_id: i64,
        request: &UpdateElementRequest,
    ) -> Result<ElementRecord, RemoteError> {
        let path = format!("/processes/{}/elements/{}", process_id, element_id);
        let response: ElementResponse = self.send(self.client.put(self.url(&path)).json(request)).await?;
        Ok(response.element)
    }

    pub async fn delete_element(&self, process_id: i64, element_id: i64) -> Result<(), RemoteError> {
        let path = format!("/processes/{}/elements/{}", process_id, element_id);
        self.send_discarding(self.client.delete(self.url(&path))).await
    }

    pub async fn create_connection(
        &self,
        process_id: i64,
        request: &CreateConnectionRequest,
    ) -> Result<ConnectionRecord, RemoteError> {
        let path = format!("/processes/{}/connections", process_id);
        let response: ConnectionResponse = self.send(self.client.post(self.url(&path)).json(request)).await?;
        Ok(response.connection)
    }

    pub async fn delete_connection(&self, process_id: i64, connection_id: i64) -> Result<(), RemoteError> {
        let path = format!("/processes/{}/connections/{}", process_id, connection_id);
        self.send_discarding(self.client.delete(self.url(&path))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = self.execute(request).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn send_discarding(&self, request: RequestBuilder) -> Result<(), RemoteError> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body).ok().map(|b| b.error);
        tracing::debug!("API call failed with {}: {}", status, body);

        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

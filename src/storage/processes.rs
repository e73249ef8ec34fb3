/// SQLite persistence for workspaces, processes, elements and connections
///
/// All element/connection operations are scoped to a process: an id that
/// exists under another process is reported as not found. Rule violations
/// surface as `StoreError` inside `anyhow::Error`.

use crate::error::StoreError;
use crate::process::records::{
    ConnectionRecord, CreateConnectionRequest, CreateElementRequest, CreateProcessRequest,
    CreateWorkspaceRequest, ElementRecord, ProcessDetail, ProcessRecord, UpdateElementRequest,
    WorkspaceRecord,
};
use crate::storage::database::Database;
use anyhow::Result;
use sqlx::sqlite::SqlitePool;

pub const DEFAULT_PROCESS_STATUS: &str = "draft";

#[derive(Debug, Clone)]
pub struct ProcessStore {
    pool: SqlitePool,
}

impl ProcessStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    // ---- workspaces ----

    pub async fn create_workspace(&self, request: &CreateWorkspaceRequest) -> Result<WorkspaceRecord> {
        let name = required("Workspace name", &request.name)?;

        let result = sqlx::query("INSERT INTO workspaces (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(&request.description)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        tracing::info!("📁 Created workspace {} ({})", id, name);

        self.get_workspace(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workspace {} vanished after insert", id))
    }

    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceRecord>> {
        let workspaces = sqlx::query_as::<_, WorkspaceRecord>(
            "SELECT id, name, description, created_at FROM workspaces ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(workspaces)
    }

    pub async fn get_workspace(&self, id: i64) -> Result<Option<WorkspaceRecord>> {
        let workspace = sqlx::query_as::<_, WorkspaceRecord>(
            "SELECT id, name, description, created_at FROM workspaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(workspace)
    }

    // ---- processes ----

    pub async fn create_process(&self, workspace_id: i64, request: &CreateProcessRequest) -> Result<ProcessRecord> {
        let name = required("Process name", &request.name)?;
        if self.get_workspace(workspace_id).await?.is_none() {
            return Err(StoreError::NotFound(format!("Workspace {} not found", workspace_id)).into());
        }

        let status = request
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_PROCESS_STATUS);

        let result = sqlx::query(
            "INSERT INTO processes (workspace_id, name, description, status) VALUES (?, ?, ?, ?)",
        )
        .bind(workspace_id)
        .bind(name)
        .bind(&request.description)
        .bind(status)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!("📋 Created process {} ({}) in workspace {}", id, name, workspace_id);

        self.get_process(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Process {} vanished after insert", id))
    }

    pub async fn list_processes(&self, workspace_id: i64) -> Result<Vec<ProcessRecord>> {
        let processes = sqlx::query_as::<_, ProcessRecord>(
            r#"
            SELECT id, workspace_id, name, description, status, created_at, updated_at
            FROM processes
            WHERE workspace_id = ?
            ORDER BY updated_at DESC, id DESC
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(processes)
    }

    pub async fn get_process(&self, id: i64) -> Result<Option<ProcessRecord>> {
        let process = sqlx::query_as::<_, ProcessRecord>(
            r#"
            SELECT id, workspace_id, name, description, status, created_at, updated_at
            FROM processes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(process)
    }

    /// Process with its elements and connections, in insertion order
    pub async fn process_detail(&self, id: i64) -> Result<Option<ProcessDetail>> {
        let Some(process) = self.get_process(id).await? else {
            return Ok(None);
        };

        let elements = sqlx::query_as::<_, ElementRecord>(
            r#"
            SELECT id, process_id, element_type, label, x_position, y_position, properties
            FROM process_elements
            WHERE process_id = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let connections = sqlx::query_as::<_, ConnectionRecord>(
            r#"
            SELECT id, process_id, source_element_id, target_element_id, label, properties
            FROM process_connections
            WHERE process_id = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ProcessDetail {
            process,
            elements,
            connections,
        }))
    }

    // ---- elements ----

    pub async fn create_element(&self, process_id: i64, request: &CreateElementRequest) -> Result<ElementRecord> {
        self.require_process(process_id).await?;
        let element_type = required("Element type", &request.element_type)?;
        let label = required("Element label", &request.label)?;
        validate_properties(&request.properties)?;

        let result = sqlx::query(
            r#"
            INSERT INTO process_elements (process_id, element_type, label, x_position, y_position, properties)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(process_id)
        .bind(element_type)
        .bind(label)
        .bind(request.x_position)
        .bind(request.y_position)
        .bind(&request.properties)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.touch_process(process_id).await?;
        tracing::debug!("Created element {} ({}) '{}' in process {}", id, element_type, label, process_id);

        self.get_element(process_id, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Element {} vanished after insert", id))
    }

    pub async fn get_element(&self, process_id: i64, element_id: i64) -> Result<Option<ElementRecord>> {
        let element = sqlx::query_as::<_, ElementRecord>(
            r#"
            SELECT id, process_id, element_type, label, x_position, y_position, properties
            FROM process_elements
            WHERE id = ? AND process_id = ?
            "#,
        )
        .bind(element_id)
        .bind(process_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(element)
    }

    /// Overwrite the supplied fields; absent ones keep their stored value
    pub async fn update_element(
        &self,
        process_id: i64,
        element_id: i64,
        request: &UpdateElementRequest,
    ) -> Result<ElementRecord> {
        let Some(mut element) = self.get_element(process_id, element_id).await? else {
            return Err(element_not_found(process_id, element_id));
        };

        if let Some(label) = &request.label {
            element.label = required("Element label", label)?.to_string();
        }
        if let Some(element_type) = &request.element_type {
            element.element_type = required("Element type", element_type)?.to_string();
        }
        if request.x_position.is_some() {
            element.x_position = request.x_position;
        }
        if request.y_position.is_some() {
            element.y_position = request.y_position;
        }
        if request.properties.is_some() {
            validate_properties(&request.properties)?;
            element.properties = request.properties.clone();
        }

        sqlx::query(
            r#"
            UPDATE process_elements
            SET element_type = ?, label = ?, x_position = ?, y_position = ?, properties = ?
            WHERE id = ? AND process_id = ?
            "#,
        )
        .bind(&element.element_type)
        .bind(&element.label)
        .bind(element.x_position)
        .bind(element.y_position)
        .bind(&element.properties)
        .bind(element_id)
        .bind(process_id)
        .execute(&self.pool)
        .await?;

        self.touch_process(process_id).await?;
        Ok(element)
    }

    /// Delete an element and every connection touching it, atomically
    ///
    /// Returns how many connections went with it.
    pub async fn delete_element(&self, process_id: i64, element_id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let connections = sqlx::query(
            r#"
            DELETE FROM process_connections
            WHERE process_id = ? AND (source_element_id = ? OR target_element_id = ?)
            "#,
        )
        .bind(process_id)
        .bind(element_id)
        .bind(element_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM process_elements WHERE id = ? AND process_id = ?")
            .bind(element_id)
            .bind(process_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(element_not_found(process_id, element_id));
        }
        tx.commit().await?;

        self.touch_process(process_id).await?;
        tracing::debug!(
            "Deleted element {} and {} connections from process {}",
            element_id,
            connections,
            process_id
        );
        Ok(connections)
    }

    // ---- connections ----

    /// Link two elements of the same process
    ///
    /// Self-loops are invalid; a link between the same pair in either
    /// direction is a conflict.
    pub async fn create_connection(
        &self,
        process_id: i64,
        request: &CreateConnectionRequest,
    ) -> Result<ConnectionRecord> {
        self.require_process(process_id).await?;
        let (source, target) = (request.source_element_id, request.target_element_id);

        if source == target {
            return Err(StoreError::Invalid(format!("Element {} cannot be connected to itself", source)).into());
        }
        for endpoint in [source, target] {
            if self.get_element(process_id, endpoint).await?.is_none() {
                return Err(StoreError::Invalid(format!(
                    "Element {} does not belong to process {}",
                    endpoint, process_id
                ))
                .into());
            }
        }
        validate_properties(&request.properties)?;

        // Duplicate check and insert in one statement; either direction counts
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO process_connections (process_id, source_element_id, target_element_id, label, properties)
            SELECT ?, ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM process_connections
                WHERE process_id = ?
                  AND ((source_element_id = ? AND target_element_id = ?)
                    OR (source_element_id = ? AND target_element_id = ?))
            )
            "#,
        )
        .bind(process_id)
        .bind(source)
        .bind(target)
        .bind(&request.label)
        .bind(&request.properties)
        .bind(process_id)
        .bind(source)
        .bind(target)
        .bind(target)
        .bind(source)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            let existing: Option<(i64,)> = sqlx::query_as(
                r#"
                SELECT id FROM process_connections
                WHERE process_id = ?
                  AND ((source_element_id = ? AND target_element_id = ?)
                    OR (source_element_id = ? AND target_element_id = ?))
                "#,
            )
            .bind(process_id)
            .bind(source)
            .bind(target)
            .bind(target)
            .bind(source)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            let message = match existing {
                Some((existing_id,)) => format!(
                    "Elements {} and {} are already connected by {}",
                    source, target, existing_id
                ),
                None => format!("Elements {} and {} are already connected", source, target),
            };
            return Err(StoreError::Conflict(message).into());
        }

        let id = inserted.last_insert_rowid();
        let connection = sqlx::query_as::<_, ConnectionRecord>(
            r#"
            SELECT id, process_id, source_element_id, target_element_id, label, properties
            FROM process_connections
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        self.touch_process(process_id).await?;
        tracing::debug!("Connected {} -> {} as {} in process {}", source, target, id, process_id);
        Ok(connection)
    }

    pub async fn delete_connection(&self, process_id: i64, connection_id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM process_connections WHERE id = ? AND process_id = ?")
            .bind(connection_id)
            .bind(process_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::NotFound(format!(
                "Connection {} not found in process {}",
                connection_id, process_id
            ))
            .into());
        }

        self.touch_process(process_id).await?;
        Ok(())
    }

    async fn require_process(&self, process_id: i64) -> Result<()> {
        match self.get_process(process_id).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("Process {} not found", process_id)).into()),
        }
    }

    async fn touch_process(&self, process_id: i64) -> Result<()> {
        sqlx::query("UPDATE processes SET updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(process_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Trimmed value, or `Invalid` when blank
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Invalid(format!("{} is required", field)).into());
    }
    Ok(trimmed)
}

fn validate_properties(properties: &Option<String>) -> Result<()> {
    if let Some(text) = properties {
        if serde_json::from_str::<serde_json::Value>(text).is_err() {
            return Err(StoreError::Invalid("properties must be JSON text".to_string()).into());
        }
    }
    Ok(())
}

fn element_not_found(process_id: i64, element_id: i64) -> anyhow::Error {
    StoreError::NotFound(format!("Element {} not found in process {}", element_id, process_id)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_process() -> (ProcessStore, i64) {
        let database = Database::in_memory().await.unwrap();
        let store = ProcessStore::new(&database);
        let workspace = store
            .create_workspace(&CreateWorkspaceRequest {
                name: "Ops".into(),
                description: None,
            })
            .await
            .unwrap();
        let process = store
            .create_process(
                workspace.id,
                &CreateProcessRequest {
                    name: "Onboarding".into(),
                    description: Some("new hires".into()),
                    status: None,
                },
            )
            .await
            .unwrap();
        (store, process.id)
    }

    fn element(label: &str) -> CreateElementRequest {
        CreateElementRequest {
            element_type: "step".into(),
            label: label.into(),
            x_position: Some(10.0),
            y_position: Some(20.0),
            properties: Some(r#"{"description":"d"}"#.into()),
        }
    }

    fn link(source: i64, target: i64) -> CreateConnectionRequest {
        CreateConnectionRequest {
            source_element_id: source,
            target_element_id: target,
            label: None,
            properties: None,
        }
    }

    fn store_error(error: &anyhow::Error) -> Option<&StoreError> {
        error.downcast_ref::<StoreError>()
    }

    #[tokio::test]
    async fn new_process_defaults_to_draft() {
        let (store, process_id) = store_with_process().await;
        let process = store.get_process(process_id).await.unwrap().unwrap();
        assert_eq!(process.status, "draft");
        assert_eq!(process.description.as_deref(), Some("new hires"));
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let (store, process_id) = store_with_process().await;
        let created = store.create_element(process_id, &element("Review")).await.unwrap();

        let updated = store
            .update_element(
                process_id,
                created.id,
                &UpdateElementRequest {
                    x_position: Some(300.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.x_position, Some(300.0));
        assert_eq!(updated.y_position, Some(20.0));
        assert_eq!(updated.label, "Review");
        assert_eq!(updated.properties.as_deref(), Some(r#"{"description":"d"}"#));
    }

    #[tokio::test]
    async fn deleting_element_removes_its_connections() {
        let (store, process_id) = store_with_process().await;
        let a = store.create_element(process_id, &element("A")).await.unwrap();
        let b = store.create_element(process_id, &element("B")).await.unwrap();
        let c = store.create_element(process_id, &element("C")).await.unwrap();
        store.create_connection(process_id, &link(a.id, b.id)).await.unwrap();
        store.create_connection(process_id, &link(b.id, c.id)).await.unwrap();
        store.create_connection(process_id, &link(a.id, c.id)).await.unwrap();

        let removed = store.delete_element(process_id, b.id).await.unwrap();

        assert_eq!(removed, 2);
        let detail = store.process_detail(process_id).await.unwrap().unwrap();
        assert_eq!(detail.elements.len(), 2);
        assert_eq!(detail.connections.len(), 1);
        assert_eq!(detail.connections[0].source_element_id, a.id);
    }

    #[tokio::test]
    async fn connection_rules_are_enforced() {
        let (store, process_id) = store_with_process().await;
        let a = store.create_element(process_id, &element("A")).await.unwrap();
        let b = store.create_element(process_id, &element("B")).await.unwrap();
        store.create_connection(process_id, &link(a.id, b.id)).await.unwrap();

        let self_loop = store.create_connection(process_id, &link(a.id, a.id)).await.unwrap_err();
        assert!(matches!(store_error(&self_loop), Some(StoreError::Invalid(_))));

        let reverse = store.create_connection(process_id, &link(b.id, a.id)).await.unwrap_err();
        assert!(matches!(store_error(&reverse), Some(StoreError::Conflict(_))));

        let foreign = store.create_connection(process_id, &link(a.id, 9999)).await.unwrap_err();
        assert!(matches!(store_error(&foreign), Some(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn concurrent_opposite_links_store_only_one() {
        let (store, process_id) = store_with_process().await;
        let a = store.create_element(process_id, &element("A")).await.unwrap();
        let b = store.create_element(process_id, &element("B")).await.unwrap();

        let forward = link(a.id, b.id);
        let backward = link(b.id, a.id);
        let (first, second) = tokio::join!(
            store.create_connection(process_id, &forward),
            store.create_connection(process_id, &backward),
        );

        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        let rejected = first.err().or(second.err()).unwrap();
        assert!(matches!(store_error(&rejected), Some(StoreError::Conflict(_))));
        let detail = store.process_detail(process_id).await.unwrap().unwrap();
        assert_eq!(detail.connections.len(), 1);
    }

    #[tokio::test]
    async fn elements_are_scoped_to_their_process() {
        let (store, process_id) = store_with_process().await;
        let a = store.create_element(process_id, &element("A")).await.unwrap();

        let error = store.delete_element(process_id + 1, a.id).await.unwrap_err();
        assert!(matches!(store_error(&error), Some(StoreError::NotFound(_))));
        assert!(store.get_element(process_id, a.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn blank_label_and_bad_properties_are_rejected() {
        let (store, process_id) = store_with_process().await;

        let blank = store.create_element(process_id, &element("  ")).await.unwrap_err();
        assert!(matches!(store_error(&blank), Some(StoreError::Invalid(_))));

        let mut bad = element("A");
        bad.properties = Some("{not json".into());
        let error = store.create_element(process_id, &bad).await.unwrap_err();
        assert!(matches!(store_error(&error), Some(StoreError::Invalid(_))));
    }
}

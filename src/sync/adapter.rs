/// Optimistic persistence adapter around the diagram model
///
/// Every mutation is applied to the local `Diagram` first and returned to the
/// caller immediately. Persistence runs afterwards as a fire-and-forget task
/// on the tokio runtime; failures go to the `ErrorSink` and the local state
/// is kept as is (no rollback, no retry).
///
/// Storage ids arrive asynchronously. Tasks report completed creations as
/// `SyncEvent`s on a channel, and the owner applies them with
/// `apply_sync_events`, so the diagram itself is only ever touched from the
/// owner's side.

use crate::error::{DiagramError, RemoteError};
use crate::process::records::{
    ConnectionRecord, CreateConnectionRequest, CreateElementRequest, ElementRecord, UpdateElementRequest,
};
use crate::process::{
    ConnectOutcome, Connection, ConnectionId, Diagram, DiagramCommands, Element, ElementId,
    ElementPatch, LayoutOutcome, LayoutPolicy, NewElement, Position, Properties, RemovedElement,
};
use crate::sync::client::ApiClient;
use crate::sync::errors::ErrorSink;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Completion of a creation started by the adapter
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    ElementCreated { local: ElementId, record: ElementRecord },
    ElementCreateFailed { local: ElementId },
    ConnectionCreated { local: ConnectionId, record: ConnectionRecord },
    ConnectionCreateFailed { local: ConnectionId },
}

/// Everything a persistence task needs, cheap to clone into `async move`
#[derive(Clone)]
struct Remote {
    process_id: i64,
    client: Arc<ApiClient>,
    errors: Arc<dyn ErrorSink>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl Remote {
    fn report(&self, context: &str, error: &RemoteError) {
        self.errors.report(context, error);
    }

    fn notify(&self, event: SyncEvent) {
        // Receiver gone means the adapter was dropped; nothing left to rebind
        let _ = self.events.send(event);
    }

    async fn create_element(&self, local: ElementId, request: CreateElementRequest) {
        match self.client.create_element(self.process_id, &request).await {
            Ok(record) => self.notify(SyncEvent::ElementCreated { local, record }),
            Err(e) => {
                self.report("create_element", &e);
                self.notify(SyncEvent::ElementCreateFailed { local });
            }
        }
    }

    async fn update_element(&self, element_id: i64, request: UpdateElementRequest) {
        if let Err(e) = self.client.update_element(self.process_id, element_id, &request).await {
            self.report("update_element", &e);
        }
    }

    async fn delete_element(&self, element_id: i64) {
        if let Err(e) = self.client.delete_element(self.process_id, element_id).await {
            self.report("delete_element", &e);
        }
    }

    async fn create_connection(&self, local: ConnectionId, request: CreateConnectionRequest) {
        match self.client.create_connection(self.process_id, &request).await {
            Ok(record) => self.notify(SyncEvent::ConnectionCreated { local, record }),
            Err(e) => {
                self.report("create_connection", &e);
                self.notify(SyncEvent::ConnectionCreateFailed { local });
            }
        }
    }

    async fn delete_connection(&self, connection_id: i64) {
        if let Err(e) = self.client.delete_connection(self.process_id, connection_id).await {
            self.report("delete_connection", &e);
        }
    }
}

/// Remote calls of one auto-layout pass, run in order by a single task
#[derive(Default)]
struct LayoutPlan {
    deletions: Vec<i64>,
    updates: Vec<(i64, UpdateElementRequest)>,
    creations: Vec<(ConnectionId, CreateConnectionRequest)>,
}

pub struct SyncedDiagram {
    diagram: Diagram,
    remote: Remote,
    runtime: Handle,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    tasks: Vec<JoinHandle<()>>,
    /// Elements whose creation request is in flight
    creating_elements: HashSet<ElementId>,
    /// In-flight elements edited locally since the request was sent
    dirty_elements: HashSet<ElementId>,
    /// In-flight elements already deleted locally
    orphaned_elements: HashSet<ElementId>,
    /// Connections whose creation request is in flight
    creating_connections: HashSet<ConnectionId>,
    /// In-flight connections already deleted locally
    orphaned_connections: HashMap<ConnectionId, Connection>,
    /// Replacement links for the same pair as an orphan, held back until the
    /// orphan's request settles (orphan -> replacement)
    successors: HashMap<ConnectionId, ConnectionId>,
    /// Connections waiting for both endpoints to get storage ids
    unsaved_connections: HashSet<ConnectionId>,
}

impl SyncedDiagram {
    /// Wrap an already loaded diagram; tasks are spawned on `runtime`
    pub fn new(diagram: Diagram, client: Arc<ApiClient>, errors: Arc<dyn ErrorSink>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            remote: Remote {
                process_id: diagram.process_id(),
                client,
                errors,
                events: tx,
            },
            diagram,
            runtime,
            events: rx,
            tasks: Vec::new(),
            creating_elements: HashSet::new(),
            dirty_elements: HashSet::new(),
            orphaned_elements: HashSet::new(),
            creating_connections: HashSet::new(),
            orphaned_connections: HashMap::new(),
            successors: HashMap::new(),
            unsaved_connections: HashSet::new(),
        }
    }

    /// Fetch a process and wrap it
    ///
    /// A failed fetch is reported and yields an empty diagram for the
    /// process; edits still work locally.
    pub async fn open(process_id: i64, client: Arc<ApiClient>, errors: Arc<dyn ErrorSink>) -> Self {
        let diagram = match client.fetch_process(process_id).await {
            Ok(detail) => Diagram::from_detail(detail),
            Err(e) => {
                errors.report("fetch_process", &e);
                tracing::warn!("Opening process {} without stored state", process_id);
                Diagram::new(process_id)
            }
        };
        Self::new(diagram, client, errors, Handle::current())
    }

    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }

    /// Number of persistence tasks not yet finished
    pub fn in_flight(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    /// Connections that exist only locally because an endpoint has no
    /// storage id yet
    pub fn unsaved_connections(&self) -> usize {
        self.unsaved_connections.len()
    }

    /// Apply completed creations; returns how many events were handled
    pub fn apply_sync_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for every outstanding task and apply what they produced,
    /// including follow-up requests triggered by rebinding
    pub async fn flush(&mut self) {
        loop {
            self.apply_sync_events();
            let tasks = std::mem::take(&mut self.tasks);
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::error!("Persistence task aborted: {}", e);
                }
            }
        }
    }

    fn apply(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::ElementCreated { local, record } => {
                self.creating_elements.remove(&local);
                if self.orphaned_elements.remove(&local) || !self.diagram.rebind_element(&local, record.id) {
                    tracing::debug!("Element {} was deleted before it was stored, removing {}", local, record.id);
                    let remote = self.remote.clone();
                    self.spawn(async move { remote.delete_element(record.id).await });
                    return;
                }
                tracing::debug!("Element {} stored as {}", local, record.id);

                let remote_id = ElementId::Remote(record.id);
                if self.dirty_elements.remove(&local) {
                    if let Some(element) = self.diagram.element(&remote_id) {
                        let request = UpdateElementRequest::full_state(element);
                        let remote = self.remote.clone();
                        self.spawn(async move { remote.update_element(record.id, request).await });
                    }
                }
                self.persist_ready_connections();
            }
            SyncEvent::ElementCreateFailed { local } => {
                self.creating_elements.remove(&local);
                self.dirty_elements.remove(&local);
                self.orphaned_elements.remove(&local);
            }
            SyncEvent::ConnectionCreated { local, record } => {
                self.creating_connections.remove(&local);
                let orphaned = self.orphaned_connections.remove(&local).is_some();
                if orphaned || !self.diagram.rebind_connection(&local, record.id) {
                    self.settle_orphan(local, Some(record));
                    return;
                }
                tracing::debug!("Connection {} stored as {}", local, record.id);
            }
            SyncEvent::ConnectionCreateFailed { local } => {
                self.creating_connections.remove(&local);
                if self.orphaned_connections.remove(&local).is_some() {
                    self.settle_orphan(local, None);
                }
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(self.runtime.spawn(task));
    }

    fn persist_update(&mut self, element: &Element) {
        match element.id {
            ElementId::Remote(id) => {
                let request = UpdateElementRequest::full_state(element);
                let remote = self.remote.clone();
                self.spawn(async move { remote.update_element(id, request).await });
            }
            local if self.creating_elements.contains(&local) => {
                self.dirty_elements.insert(local);
            }
            local => tracing::debug!("Element {} was never stored, update kept locally", local),
        }
    }

    fn persist_connection(&mut self, connection: &Connection) {
        match CreateConnectionRequest::from_connection(connection) {
            Some(request) => {
                let local = connection.id;
                self.unsaved_connections.remove(&local);
                if self.wait_for_orphan(connection) {
                    return;
                }
                self.creating_connections.insert(local);
                let remote = self.remote.clone();
                self.spawn(async move { remote.create_connection(local, request).await });
            }
            None => {
                self.unsaved_connections.insert(connection.id);
            }
        }
    }

    fn persist_ready_connections(&mut self) {
        let ready: Vec<Connection> = self
            .diagram
            .connections()
            .iter()
            .filter(|c| self.unsaved_connections.contains(&c.id))
            .filter(|c| c.source.remote_id().is_some() && c.target.remote_id().is_some())
            .cloned()
            .collect();
        for connection in &ready {
            self.persist_connection(connection);
        }
    }

    /// Local bookkeeping for a connection that left the diagram; returns
    /// the storage id to delete, if it has one
    fn forget_connection(&mut self, connection: &Connection) -> Option<i64> {
        match connection.id {
            ConnectionId::Remote(id) => Some(id),
            local => {
                if self.creating_connections.contains(&local) {
                    self.orphaned_connections.insert(local, connection.clone());
                }
                self.unsaved_connections.remove(&local);
                self.successors.retain(|_, successor| *successor != local);
                None
            }
        }
    }

    /// Queue `connection` behind an in-flight orphan linking the same pair.
    ///
    /// The server still holds (or is about to hold) the orphan's row, so a
    /// create sent now would be refused as a duplicate.
    fn wait_for_orphan(&mut self, connection: &Connection) -> bool {
        let Some(orphan) = self
            .orphaned_connections
            .values()
            .find(|orphan| orphan.links(&connection.source, &connection.target))
            .map(|orphan| orphan.id)
        else {
            return false;
        };
        tracing::debug!("Connection {} waits for replaced {} to settle", connection.id, orphan);
        self.successors.insert(orphan, connection.id);
        true
    }

    /// Resolve a creation whose connection left the diagram while in flight.
    ///
    /// A queued replacement takes over the stored row when it matches,
    /// otherwise the row is removed before the replacement is created.
    fn settle_orphan(&mut self, local: ConnectionId, stored: Option<ConnectionRecord>) {
        let successor = self
            .successors
            .remove(&local)
            .and_then(|id| self.diagram.connection(&id).cloned());

        match (stored, successor) {
            (Some(record), Some(next)) if is_stored_as(&next, &record) => {
                tracing::debug!("Connection {} takes over stored {}", next.id, record.id);
                self.diagram.rebind_connection(&next.id, record.id);
            }
            (Some(record), Some(next)) => {
                let remote = self.remote.clone();
                match CreateConnectionRequest::from_connection(&next) {
                    Some(request) => {
                        let next_id = next.id;
                        self.creating_connections.insert(next_id);
                        self.spawn(async move {
                            remote.delete_connection(record.id).await;
                            remote.create_connection(next_id, request).await;
                        });
                    }
                    None => {
                        self.unsaved_connections.insert(next.id);
                        self.spawn(async move { remote.delete_connection(record.id).await });
                    }
                }
            }
            (Some(record), None) => {
                tracing::debug!("Connection {} was deleted before it was stored, removing {}", local, record.id);
                let remote = self.remote.clone();
                self.spawn(async move { remote.delete_connection(record.id).await });
            }
            (None, Some(next)) => self.persist_connection(&next),
            (None, None) => {}
        }
    }
}

impl DiagramCommands for SyncedDiagram {
    fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    fn add_element(&mut self, new: NewElement) -> Result<Element, DiagramError> {
        let element = self.diagram.add_element(new)?;

        let local = element.id;
        let request = CreateElementRequest::from_element(&element);
        self.creating_elements.insert(local);
        let remote = self.remote.clone();
        self.spawn(async move { remote.create_element(local, request).await });

        Ok(element)
    }

    fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> Result<Element, DiagramError> {
        let element = self.diagram.update_element(id, patch)?;
        self.persist_update(&element);
        Ok(element)
    }

    fn move_element(&mut self, id: &ElementId, to: Position) -> Result<Element, DiagramError> {
        self.diagram.move_element(id, to)
    }

    fn finish_move(&mut self, id: &ElementId) {
        if let Some(element) = self.diagram.element(id).cloned() {
            self.persist_update(&element);
        }
    }

    fn delete_element(&mut self, id: &ElementId) -> Result<RemovedElement, DiagramError> {
        let removed = self.diagram.delete_element(id)?;

        // Stored connections go with the element on the server side
        for connection in &removed.connections {
            self.forget_connection(connection);
        }

        match removed.element.id {
            ElementId::Remote(element_id) => {
                let remote = self.remote.clone();
                self.spawn(async move { remote.delete_element(element_id).await });
            }
            local => {
                self.dirty_elements.remove(&local);
                if self.creating_elements.contains(&local) {
                    self.orphaned_elements.insert(local);
                }
            }
        }

        Ok(removed)
    }

    fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        label: Option<String>,
    ) -> Result<ConnectOutcome, DiagramError> {
        let outcome = self.diagram.connect(source, target, label)?;
        if let ConnectOutcome::Created(connection) = &outcome {
            self.persist_connection(connection);
        }
        Ok(outcome)
    }

    fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection, DiagramError> {
        let connection = self.diagram.delete_connection(id)?;
        if let Some(connection_id) = self.forget_connection(&connection) {
            let remote = self.remote.clone();
            self.spawn(async move { remote.delete_connection(connection_id).await });
        }
        Ok(connection)
    }

    /// Deletions, position updates and chain creations go out in that order
    /// from one task so a replaced link never collides with its successor.
    fn auto_layout(&mut self, policy: LayoutPolicy) -> Option<LayoutOutcome> {
        let outcome = self.diagram.auto_layout(policy)?;
        let mut plan = LayoutPlan::default();

        for connection in &outcome.removed {
            if let Some(id) = self.forget_connection(connection) {
                plan.deletions.push(id);
            }
        }

        let elements: Vec<Element> = self.diagram.elements().to_vec();
        for element in &elements {
            match element.id {
                ElementId::Remote(id) => plan.updates.push((id, UpdateElementRequest::full_state(element))),
                _ => self.persist_update(element),
            }
        }

        for connection in &outcome.added {
            match CreateConnectionRequest::from_connection(connection) {
                Some(_) if self.wait_for_orphan(connection) => {}
                Some(request) => {
                    self.creating_connections.insert(connection.id);
                    plan.creations.push((connection.id, request));
                }
                None => {
                    self.unsaved_connections.insert(connection.id);
                }
            }
        }

        let remote = self.remote.clone();
        self.spawn(async move {
            for id in plan.deletions {
                remote.delete_connection(id).await;
            }
            for (id, request) in plan.updates {
                remote.update_element(id, request).await;
            }
            for (local, request) in plan.creations {
                remote.create_connection(local, request).await;
            }
        });

        Some(outcome)
    }
}

/// Whether the stored row already says what `connection` says
fn is_stored_as(connection: &Connection, record: &ConnectionRecord) -> bool {
    connection.source.remote_id() == Some(record.source_element_id)
        && connection.target.remote_id() == Some(record.target_element_id)
        && connection.label == record.label
        && connection.properties == Properties::parse_lenient(record.properties.as_deref())
}

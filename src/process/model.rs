/// In-memory diagram model for the process open in the editor
///
/// Pure and synchronous: every operation either applies completely or
/// returns a `DiagramError` without touching state. Persistence lives in
/// `sync::SyncedDiagram`, which wraps this type.

use crate::error::DiagramError;
use crate::process::layout::{self, GridLayout};
use crate::process::records::{parse_properties, ProcessDetail};
use crate::process::types::{
    ConnectOutcome, Connection, ConnectionId, Element, ElementId, ElementPatch, ElementType,
    NewElement, Position, Properties, RemovedElement,
};

/// What auto-layout does with existing connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPolicy {
    /// Discard all connections and link the elements as a chain in
    /// collection order (element[i] -> element[i + 1])
    #[default]
    ReplaceWithChain,
    /// Reposition elements only
    KeepConnections,
}

/// Result of an auto-layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutcome {
    pub grid: GridLayout,
    /// Connections dropped by chain replacement
    pub removed: Vec<Connection>,
    /// Chain connections created in their place
    pub added: Vec<Connection>,
}

/// Elements and connections of one process
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    process_id: i64,
    elements: Vec<Element>,
    connections: Vec<Connection>,
}

impl Diagram {
    /// Empty diagram for `process_id`
    pub fn new(process_id: i64) -> Self {
        Self {
            process_id,
            elements: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Build the model from a fetch-process response
    ///
    /// Missing positions get a default placement, unreadable properties
    /// become empty, and connections pointing at unknown elements are dropped.
    pub fn from_detail(detail: ProcessDetail) -> Self {
        let mut rng = rand::rng();
        let mut diagram = Self::new(detail.process.id);

        for record in detail.elements {
            let position = match (record.x_position, record.y_position) {
                (Some(x), Some(y)) => Position::new(x, y),
                _ => layout::default_position(&mut rng),
            };
            diagram.elements.push(Element {
                id: ElementId::Remote(record.id),
                element_type: ElementType::from(record.element_type),
                label: record.label,
                position,
                properties: parse_properties(&record.properties),
            });
        }

        for record in detail.connections {
            let source = ElementId::Remote(record.source_element_id);
            let target = ElementId::Remote(record.target_element_id);
            if diagram.element(&source).is_none() || diagram.element(&target).is_none() {
                tracing::warn!(
                    "Dropping connection {} of process {}: endpoint {} -> {} is missing",
                    record.id,
                    diagram.process_id,
                    source,
                    target
                );
                continue;
            }
            diagram.connections.push(Connection {
                id: ConnectionId::Remote(record.id),
                source,
                target,
                label: record.label.filter(|l| !l.is_empty()),
                properties: parse_properties(&record.properties),
            });
        }

        tracing::debug!(
            "Loaded process {} with {} elements and {} connections",
            diagram.process_id,
            diagram.elements.len(),
            diagram.connections.len()
        );

        diagram
    }

    pub fn process_id(&self) -> i64 {
        self.process_id
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Existing connection between `a` and `b` in either direction
    pub fn find_link(&self, a: &ElementId, b: &ElementId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.links(a, b))
    }

    /// Connections touching `element` at either end
    pub fn connections_of<'a>(
        &'a self,
        element: &'a ElementId,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.references(element))
    }

    /// Append a new element with a temporary local id
    pub fn add_element(&mut self, new: NewElement) -> Result<Element, DiagramError> {
        if new.label.trim().is_empty() {
            return Err(DiagramError::EmptyLabel);
        }

        let position = match new.position {
            Some(position) => position.clamped(),
            None => layout::default_position(&mut rand::rng()),
        };

        let element = Element {
            id: ElementId::local(),
            element_type: new.element_type,
            label: new.label,
            position,
            properties: new.properties,
        };
        self.elements.push(element.clone());

        tracing::debug!("Added element {} ({}) to process {}", element.id, element.element_type, self.process_id);
        Ok(element)
    }

    /// Apply the supplied fields of `patch`; the rest keep their values
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> Result<Element, DiagramError> {
        if matches!(&patch.label, Some(label) if label.trim().is_empty()) {
            return Err(DiagramError::EmptyLabel);
        }

        let element = self.element_mut(id)?;
        if let Some(label) = patch.label {
            element.label = label;
        }
        if let Some(element_type) = patch.element_type {
            element.element_type = element_type;
        }
        if let Some(position) = patch.position {
            element.position = position.clamped();
        }
        if let Some(properties) = patch.properties {
            element.properties = properties;
        }

        Ok(element.clone())
    }

    /// Move an element, clamping both axes to the canvas' non-negative range
    pub fn move_element(&mut self, id: &ElementId, to: Position) -> Result<Element, DiagramError> {
        let element = self.element_mut(id)?;
        element.position = to.clamped();
        Ok(element.clone())
    }

    /// Remove an element and every connection that references it
    ///
    /// Connections go first so no intermediate state has dangling edges.
    pub fn delete_element(&mut self, id: &ElementId) -> Result<RemovedElement, DiagramError> {
        let index = self
            .elements
            .iter()
            .position(|e| &e.id == id)
            .ok_or(DiagramError::ElementNotFound(*id))?;

        let (removed_connections, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.connections)
            .into_iter()
            .partition(|c| c.references(id));
        self.connections = kept;

        let element = self.elements.remove(index);

        tracing::debug!(
            "Deleted element {} and {} connections from process {}",
            id,
            removed_connections.len(),
            self.process_id
        );

        Ok(RemovedElement {
            element,
            connections: removed_connections,
        })
    }

    /// Link `source` to `target`
    ///
    /// Both must exist and differ. If they are already linked in either
    /// direction nothing is added.
    pub fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        label: Option<String>,
    ) -> Result<ConnectOutcome, DiagramError> {
        if self.element(source).is_none() {
            return Err(DiagramError::ElementNotFound(*source));
        }
        if self.element(target).is_none() {
            return Err(DiagramError::ElementNotFound(*target));
        }
        if source == target {
            return Err(DiagramError::SelfConnection(*source));
        }

        if let Some(existing) = self.find_link(source, target) {
            tracing::debug!("Elements {} and {} already linked by {}", source, target, existing.id);
            return Ok(ConnectOutcome::AlreadyConnected(existing.id));
        }

        let connection = Connection {
            id: ConnectionId::local(),
            source: *source,
            target: *target,
            label: label.filter(|l| !l.trim().is_empty()),
            properties: Properties::new(),
        };
        self.connections.push(connection.clone());

        Ok(ConnectOutcome::Created(connection))
    }

    pub fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection, DiagramError> {
        let index = self
            .connections
            .iter()
            .position(|c| &c.id == id)
            .ok_or(DiagramError::ConnectionNotFound(*id))?;
        Ok(self.connections.remove(index))
    }

    /// Arrange all elements on a centred square grid, row-major in
    /// collection order
    ///
    /// With `LayoutPolicy::ReplaceWithChain` and at least two elements the
    /// existing connections are discarded and replaced by a chain.
    pub fn auto_layout(&mut self, policy: LayoutPolicy) -> Option<LayoutOutcome> {
        let grid = GridLayout::for_count(self.elements.len())?;

        for (index, element) in self.elements.iter_mut().enumerate() {
            element.position = grid.position(index);
        }

        let mut outcome = LayoutOutcome {
            grid,
            removed: Vec::new(),
            added: Vec::new(),
        };

        if policy == LayoutPolicy::ReplaceWithChain && self.elements.len() > 1 {
            outcome.added = self
                .elements
                .windows(2)
                .map(|pair| Connection {
                    id: ConnectionId::local(),
                    source: pair[0].id,
                    target: pair[1].id,
                    label: None,
                    properties: Properties::new(),
                })
                .collect();
            outcome.removed = std::mem::replace(&mut self.connections, outcome.added.clone());
        }

        tracing::info!(
            "Auto-layout of process {}: {}x{} grid, {} connections replaced",
            self.process_id,
            grid.columns,
            grid.rows,
            outcome.removed.len()
        );

        Some(outcome)
    }

    /// Swap a temporary element id for the one issued by storage
    ///
    /// Returns false when the local id is no longer in the diagram.
    pub fn rebind_element(&mut self, local: &ElementId, remote: i64) -> bool {
        let remote = ElementId::Remote(remote);
        let Some(element) = self.elements.iter_mut().find(|e| &e.id == local) else {
            return false;
        };
        element.id = remote;

        for connection in &mut self.connections {
            if &connection.source == local {
                connection.source = remote;
            }
            if &connection.target == local {
                connection.target = remote;
            }
        }
        true
    }

    pub fn rebind_connection(&mut self, local: &ConnectionId, remote: i64) -> bool {
        match self.connections.iter_mut().find(|c| &c.id == local) {
            Some(connection) => {
                connection.id = ConnectionId::Remote(remote);
                true
            }
            None => false,
        }
    }

    fn element_mut(&mut self, id: &ElementId) -> Result<&mut Element, DiagramError> {
        self.elements
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or(DiagramError::ElementNotFound(*id))
    }
}

/// Mutation surface shared by the local model and the synced adapter
///
/// The editor state machine drives a `DiagramCommands` implementation, so the
/// same gesture handling works offline (`Diagram`) and with persistence
/// (`sync::SyncedDiagram`).

use crate::error::DiagramError;
use crate::process::model::{Diagram, LayoutOutcome, LayoutPolicy};
use crate::process::types::{
    ConnectOutcome, Connection, ConnectionId, Element, ElementId, ElementPatch, NewElement,
    Position, RemovedElement,
};

pub trait DiagramCommands {
    /// Current state of the diagram
    fn diagram(&self) -> &Diagram;

    fn add_element(&mut self, new: NewElement) -> Result<Element, DiagramError>;

    fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> Result<Element, DiagramError>;

    /// Continuous repositioning while dragging; not persisted on its own
    fn move_element(&mut self, id: &ElementId, to: Position) -> Result<Element, DiagramError>;

    /// Called once a drag ends so the final position can be persisted
    fn finish_move(&mut self, id: &ElementId);

    fn delete_element(&mut self, id: &ElementId) -> Result<RemovedElement, DiagramError>;

    fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        label: Option<String>,
    ) -> Result<ConnectOutcome, DiagramError>;

    fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection, DiagramError>;

    fn auto_layout(&mut self, policy: LayoutPolicy) -> Option<LayoutOutcome>;
}

impl DiagramCommands for Diagram {
    fn diagram(&self) -> &Diagram {
        self
    }

    fn add_element(&mut self, new: NewElement) -> Result<Element, DiagramError> {
        Diagram::add_element(self, new)
    }

    fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> Result<Element, DiagramError> {
        Diagram::update_element(self, id, patch)
    }

    fn move_element(&mut self, id: &ElementId, to: Position) -> Result<Element, DiagramError> {
        Diagram::move_element(self, id, to)
    }

    fn finish_move(&mut self, _id: &ElementId) {}

    fn delete_element(&mut self, id: &ElementId) -> Result<RemovedElement, DiagramError> {
        Diagram::delete_element(self, id)
    }

    fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        label: Option<String>,
    ) -> Result<ConnectOutcome, DiagramError> {
        Diagram::connect(self, source, target, label)
    }

    fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection, DiagramError> {
        Diagram::delete_connection(self, id)
    }

    fn auto_layout(&mut self, policy: LayoutPolicy) -> Option<LayoutOutcome> {
        Diagram::auto_layout(self, policy)
    }
}

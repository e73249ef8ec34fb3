/// Interaction state machine of the diagram editor
///
/// Turns pointer gestures into diagram operations and tracks the transient
/// selection/drag/connect state. The whole state is one sum type, so
/// combinations like "dragging while connecting" cannot be represented.

use crate::config::EditorConfig;
use crate::editor::shape::{hit_test, Hit, Shape};
use crate::error::DiagramError;
use crate::process::{
    ConnectOutcome, Connection, ConnectionId, DiagramCommands, Element, ElementId, LayoutOutcome,
    LayoutPolicy, Position, RemovedElement,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Element shown in the properties panel
    ElementSelected(ElementId),
    /// Connection shown in the properties panel
    ConnectionSelected(ConnectionId),
    /// Element follows the pointer until release
    Dragging {
        element: ElementId,
        /// Pointer position relative to the element's origin at grab time
        grab: Position,
        /// Whether the element has been repositioned since the grab
        moved: bool,
    },
    /// Waiting for the target of a new connection
    Connecting {
        /// `None` until an element has been picked as the source
        source: Option<ElementId>,
        /// Last pointer position, for the preview line
        pointer: Option<Position>,
    },
}

/// Pointer and toolbar input, in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    PointerDown(Position),
    PointerMove(Position),
    PointerUp,
    Click(Position),
    DoubleClick(Position),
    /// Toolbar toggle for connection mode
    ToggleConnectionMode,
    Cancel,
    /// Delete whatever is selected
    DeleteSelected,
}

/// Model-level effect of a gesture
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Moved(Element),
    Connected(Connection),
    AlreadyConnected(ConnectionId),
    ElementDeleted(RemovedElement),
    ConnectionDeleted(Connection),
    /// The model refused the operation; shown as inline feedback
    Rejected(DiagramError),
}

#[derive(Debug, Clone, Default)]
pub struct Editor {
    state: InteractionState,
    layout_policy: LayoutPolicy,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        let layout_policy = if config.keep_connections_on_layout {
            LayoutPolicy::KeepConnections
        } else {
            LayoutPolicy::ReplaceWithChain
        };
        Self {
            state: InteractionState::Idle,
            layout_policy,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.state, InteractionState::Connecting { .. })
    }

    pub fn selected_element<'a, M: DiagramCommands + ?Sized>(&self, model: &'a M) -> Option<&'a Element> {
        match self.state {
            InteractionState::ElementSelected(id) | InteractionState::Dragging { element: id, .. } => {
                model.diagram().element(&id)
            }
            _ => None,
        }
    }

    pub fn selected_connection<'a, M: DiagramCommands + ?Sized>(
        &self,
        model: &'a M,
    ) -> Option<&'a Connection> {
        match self.state {
            InteractionState::ConnectionSelected(id) => model.diagram().connection(&id),
            _ => None,
        }
    }

    /// Rubber-band line from the pending source to the pointer
    pub fn preview_line<M: DiagramCommands + ?Sized>(&self, model: &M) -> Option<(Position, Position)> {
        match self.state {
            InteractionState::Connecting {
                source: Some(source),
                pointer: Some(pointer),
            } => {
                let element = model.diagram().element(&source)?;
                Some((Shape::for_element(element).center(), pointer))
            }
            _ => None,
        }
    }

    /// Feed one gesture through the state machine
    pub fn handle<M: DiagramCommands + ?Sized>(&mut self, model: &mut M, gesture: Gesture) -> Option<EditorEvent> {
        match gesture {
            Gesture::PointerDown(at) => {
                self.pointer_down(model, at);
                None
            }
            Gesture::PointerMove(at) => self.pointer_move(model, at),
            Gesture::PointerUp => {
                if let InteractionState::Dragging { element, moved, .. } = self.state {
                    if moved {
                        model.finish_move(&element);
                    }
                    self.state = InteractionState::ElementSelected(element);
                }
                None
            }
            Gesture::Click(at) => self.click(model, at),
            Gesture::DoubleClick(at) => {
                if !self.is_connecting() {
                    if let Hit::Element(id) = hit_test(model.diagram(), at) {
                        tracing::debug!("Connection mode entered from element {}", id);
                        self.state = InteractionState::Connecting {
                            source: Some(id),
                            pointer: Some(at),
                        };
                    }
                }
                None
            }
            Gesture::ToggleConnectionMode => {
                self.state = match self.state {
                    InteractionState::Connecting { .. } => InteractionState::Idle,
                    InteractionState::ElementSelected(id) => InteractionState::Connecting {
                        source: Some(id),
                        pointer: None,
                    },
                    _ => InteractionState::Connecting {
                        source: None,
                        pointer: None,
                    },
                };
                None
            }
            Gesture::Cancel => {
                self.state = InteractionState::Idle;
                None
            }
            Gesture::DeleteSelected => self.delete_selected(model),
        }
    }

    /// Run auto-layout with the configured policy
    ///
    /// Drops a connection selection that the layout removed and aborts any
    /// drag or pending connection.
    pub fn auto_layout<M: DiagramCommands + ?Sized>(&mut self, model: &mut M) -> Option<LayoutOutcome> {
        let outcome = model.auto_layout(self.layout_policy)?;
        self.state = match self.state {
            InteractionState::ConnectionSelected(id) if model.diagram().connection(&id).is_none() => {
                InteractionState::Idle
            }
            InteractionState::Dragging { .. } | InteractionState::Connecting { .. } => InteractionState::Idle,
            other => other,
        };
        Some(outcome)
    }

    fn pointer_down<M: DiagramCommands + ?Sized>(&mut self, model: &M, at: Position) {
        if self.is_connecting() {
            return;
        }
        if let Hit::Element(id) = hit_test(model.diagram(), at) {
            if let Some(element) = model.diagram().element(&id) {
                self.state = InteractionState::Dragging {
                    element: id,
                    grab: at.offset_from(element.position),
                    moved: false,
                };
            }
        }
    }

    fn pointer_move<M: DiagramCommands + ?Sized>(&mut self, model: &mut M, at: Position) -> Option<EditorEvent> {
        match &mut self.state {
            InteractionState::Dragging { element, grab, moved } => {
                let id = *element;
                let target = at.offset_from(*grab);
                match model.move_element(&id, target) {
                    Ok(element) => {
                        *moved = true;
                        Some(EditorEvent::Moved(element))
                    }
                    Err(e) => {
                        self.state = InteractionState::Idle;
                        Some(EditorEvent::Rejected(e))
                    }
                }
            }
            InteractionState::Connecting { pointer, .. } => {
                *pointer = Some(at);
                None
            }
            _ => None,
        }
    }

    fn click<M: DiagramCommands + ?Sized>(&mut self, model: &mut M, at: Position) -> Option<EditorEvent> {
        let hit = hit_test(model.diagram(), at);

        if let InteractionState::Connecting { source, .. } = self.state {
            let Hit::Element(target) = hit else {
                return None;
            };
            let Some(source) = source else {
                self.state = InteractionState::Connecting {
                    source: Some(target),
                    pointer: Some(at),
                };
                return None;
            };

            self.state = InteractionState::Idle;
            if source == target {
                tracing::debug!("Connection mode cancelled on source element {}", source);
                return None;
            }
            return Some(match model.connect(&source, &target, None) {
                Ok(ConnectOutcome::Created(connection)) => EditorEvent::Connected(connection),
                Ok(ConnectOutcome::AlreadyConnected(existing)) => EditorEvent::AlreadyConnected(existing),
                Err(e) => EditorEvent::Rejected(e),
            });
        }

        match (self.state, hit) {
            (InteractionState::Dragging { .. }, _) => {}
            (_, Hit::Element(id)) => self.state = InteractionState::ElementSelected(id),
            (_, Hit::Connection(id)) => self.state = InteractionState::ConnectionSelected(id),
            (_, Hit::Canvas) => self.state = InteractionState::Idle,
        }
        None
    }

    fn delete_selected<M: DiagramCommands + ?Sized>(&mut self, model: &mut M) -> Option<EditorEvent> {
        let event = match self.state {
            InteractionState::ElementSelected(id) | InteractionState::Dragging { element: id, .. } => {
                match model.delete_element(&id) {
                    Ok(removed) => EditorEvent::ElementDeleted(removed),
                    Err(e) => EditorEvent::Rejected(e),
                }
            }
            InteractionState::ConnectionSelected(id) => match model.delete_connection(&id) {
                Ok(connection) => EditorEvent::ConnectionDeleted(connection),
                Err(e) => EditorEvent::Rejected(e),
            },
            _ => return None,
        };
        self.state = InteractionState::Idle;
        Some(event)
    }
}

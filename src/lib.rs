/// ProcessFlow: process diagramming backend
///
/// Flowchart-style process diagrams: an in-memory diagram model with its
/// editing rules, the editor's interaction state machine, an optimistic
/// persistence adapter, and the REST/SQLite service it talks to.

// Core configuration and setup
pub mod config;

// Error taxonomy shared by all layers
pub mod error;

// Diagram model - elements, connections, layout and editing rules
pub mod process;

// Editor - shapes, hit-testing and the interaction state machine
pub mod editor;

// Editor-side persistence - API client, error log, optimistic adapter
pub mod sync;

// SQLite storage layer
pub mod storage;

// HTTP API layer - REST endpoints over the storage layer
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use editor::{Editor, EditorEvent, Gesture, InteractionState};
pub use error::{DiagramError, RemoteError, StoreError};
pub use process::{Connection, Diagram, DiagramCommands, Element, ElementId, ElementType, Position};
pub use server::start_server;
pub use sync::{ApiClient, ErrorLog, Session, SyncedDiagram};

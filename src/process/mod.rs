/// Process Diagram Layer
///
/// This module holds the diagram of the process open in the editor:
/// - Type definitions (Element, Connection, ids, properties)
/// - Storage rows and API payloads
/// - The pure in-memory model with its editing rules
/// - Grid auto-layout and default placement

// Core diagram type definitions
pub mod types;

// Wire/storage records shared by the API layer and the client
pub mod records;

// Canvas geometry and auto-layout
pub mod layout;

// Pure diagram model
pub mod model;

// Mutation trait driven by the editor
pub mod commands;

// Re-export commonly used types
pub use commands::DiagramCommands;
pub use model::{Diagram, LayoutOutcome, LayoutPolicy};
pub use types::{
    ConnectOutcome, Connection, ConnectionId, Element, ElementId, ElementPatch, ElementType,
    NewElement, Position, Properties, RemovedElement,
};

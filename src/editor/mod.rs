/// Diagram Editor Layer
///
/// Canvas-side behavior of the process editor:
/// - Element shapes and hit-testing
/// - The interaction state machine that turns gestures into model operations

// Shape table, geometry and hit-testing
pub mod shape;

// Selection / drag / connect state machine
pub mod state;

pub use shape::{hit_test, Hit, Shape, ShapeKind};
pub use state::{Editor, EditorEvent, Gesture, InteractionState};

/// Persistence Boundary (editor side)
///
/// Connects the in-memory diagram to the REST API:
/// - Session credentials and forced logout
/// - Typed HTTP client
/// - Error classification and the recent-errors log
/// - The optimistic adapter that persists edits in the background

// Session-scoped bearer token
pub mod session;

// reqwest client for the /api routes
pub mod client;

// ErrorSink trait and bounded error log
pub mod errors;

// Optimistic local-first adapter
pub mod adapter;

pub use adapter::{SyncEvent, SyncedDiagram};
pub use client::ApiClient;
pub use errors::{ErrorEntry, ErrorLog, ErrorSink};
pub use session::Session;

/// Storage Layer
///
/// Durable source of truth for workspaces and process diagrams:
/// - SQLite bootstrap and schema
/// - Process/element/connection CRUD with the connection rules

// Pool setup and schema
pub mod database;

// ProcessStore CRUD
pub mod processes;

pub use database::Database;
pub use processes::ProcessStore;

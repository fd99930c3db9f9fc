//! Document server: stores shared trips and pushes changes to subscribers.

pub mod hub;
pub mod routes;
pub mod storage;

pub use hub::DocumentHub;
pub use routes::{router, AppState};
pub use storage::{init_db, init_memory_db, DocumentRepository, ServerStorageError};

//! Repository implementations — one struct per storage backend.
//!
//! Every method returns a `Result<T, DbError>`.
//! No business logic and no domain types: records in, records out.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::{DbError, WorkflowRecord};

pub use file::FileStore;
pub use memory::InMemoryStore;

/// Storage backend for saved workflows.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Fetch a workflow by id.
    ///
    /// Returns [`DbError::NotFound`] if nothing was saved under `id`.
    async fn load_workflow(&self, id: &str) -> Result<WorkflowRecord, DbError>;

    /// Insert or replace the workflow stored under `record.id`.
    async fn save_workflow(&self, record: WorkflowRecord) -> Result<(), DbError>;

    /// Ids of every stored workflow, sorted.
    async fn list_workflows(&self) -> Result<Vec<String>, DbError>;
}

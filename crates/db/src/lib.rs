//! `db` crate — pure persistence layer.
//!
//! Provides the [`GraphStore`] contract, the persisted [`WorkflowRecord`]
//! row, and two stores: an in-memory one for tests and embedding, and a
//! JSON-file one for the CLI. No business logic lives here.

pub mod error;
pub mod models;
pub mod repository;

pub use error::DbError;
pub use models::WorkflowRecord;
pub use repository::{FileStore, GraphStore, InMemoryStore};

//! Engine-level error types.

use thiserror::Error;

use crate::auth::Capability;

/// Errors produced by the workflow engine.
///
/// Node failures are *not* errors: they are recorded as `NodeResult`s in the
/// sealed `ExecutionRun`. Only refusals to start a run, editing misuse and
/// I/O problems surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Pre-run refusals ------

    /// The graph has no nodes.
    #[error("nothing to execute: the workflow has no nodes")]
    NothingToExecute,

    /// Action (or AI) nodes with no incoming edge.
    #[error("disconnected action nodes: {}", .0.join(", "))]
    DisconnectedActions(Vec<String>),

    /// Action (or AI) nodes that no trigger-seeded walk reaches.
    #[error("action nodes not reachable from any trigger: {}", .0.join(", "))]
    UnscheduledActions(Vec<String>),

    /// Nodes need credentials that are not currently held.
    #[error("authorization required: {}", join_capabilities(.0))]
    AuthorizationRequired(Vec<Capability>),

    // ------ Editing errors ------

    /// The referenced node does not exist in the graph.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// A node with this id is already in the graph.
    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    /// An edge with this id is already in the graph.
    #[error("edge '{0}' already exists")]
    DuplicateEdge(String),

    // ------ I/O ------

    /// A graph or config document could not be (de)serialized.
    #[error("invalid document: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),
}

fn join_capabilities(caps: &[Capability]) -> String {
    caps.iter().map(|c| c.tag()).collect::<Vec<_>>().join(", ")
}

//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// None of these are retried by the engine; every variant ends the run.
/// Retrying a transient failure is the executor's own business before it
/// reports back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node lacks a field it needs to do its job.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// An external credential the node depends on is not held.
    #[error("authorization missing: {0}")]
    Unauthorized(String),

    /// The executor ran and reported failure (network error, rejected request, …).
    #[error("{0}")]
    Failed(String),
}

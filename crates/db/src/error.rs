//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("workflow '{0}' not found")]
    NotFound(String),

    #[error("invalid workflow id '{0}'")]
    InvalidId(String),
}

//! `nodes` crate — the `ExecutableNode` trait and built-in node implementations.
//!
//! Every node executor, built-in or plugin, must implement
//! [`ExecutableNode`]. The engine crate dispatches execution through this
//! trait object, keyed by the node's subtype string.

pub mod error;
pub mod traits;
pub mod mock;
pub mod builtin;
pub mod registry;

pub use error::NodeError;
pub use traits::{ExecutableNode, ExecutionContext};
pub use registry::{builtin_registry, NodeRegistry};

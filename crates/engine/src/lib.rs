//! `engine` crate — graph model, validation, scheduling and the execution engine.

pub mod models;
pub mod node_config;
pub mod error;
pub mod dag;
pub mod validation;
pub mod auth;
pub mod notify;
pub mod run;
pub mod executor;
pub mod operations;
pub mod session;
pub mod config;
pub mod persistence;

pub use models::{Edge, GraphModel, Node, NodeKind, Position};
pub use node_config::NodeConfig;
pub use error::EngineError;
pub use dag::{execution_order, layered_levels, topological_order, SchedulePlan};
pub use validation::{validate, ValidationConfig, ValidationEngine, ValidationReport};
pub use auth::{Capability, CapabilityProvider, StaticCapabilities};
pub use notify::{Notifier, NotifyLevel, TracingNotifier};
pub use run::{ExecutionRun, FailureKind, NodeResult, NodeStatus, RunStatus};
pub use executor::{CancellationFlag, ExecutorConfig, WorkflowExecutor};
pub use operations::OperationsStack;
pub use session::EditorSession;
pub use config::EngineConfig;
pub use persistence::{load_graph, save_graph};

#[cfg(test)]
mod executor_tests;

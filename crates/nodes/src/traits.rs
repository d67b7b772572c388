//! The `ExecutableNode` trait — the contract every node executor must fulfil.

use async_trait::async_trait;
use serde_json::Value;

use crate::NodeError;

/// Everything an executor is told about the node it is running.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency. The node's
/// typed configuration is handed over in its JSON wire form.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// ID of the current execution run.
    pub run_id: uuid::Uuid,
    /// ID of the node being executed.
    pub node_id: String,
    /// Subtype the executor was resolved by.
    pub subtype: String,
    /// Human-readable node label.
    pub label: String,
    /// The node's configuration block.
    pub config: Value,
    /// Outputs of the node's direct predecessors, in edge order.
    pub inputs: Vec<Value>,
}

impl ExecutionContext {
    /// Look up a string field in the config block, treating blanks as absent.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// The core executor trait.
///
/// Implementations should report failure through [`NodeError`] rather than
/// panicking; the engine does catch panics, but treats them as unexpected.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node and return its JSON output.
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Value, NodeError>;

    /// Whether a successful output actually produced something.
    ///
    /// A trigger that ran cleanly but matched nothing overrides this to
    /// return `false`, which the engine reports as a failure.
    fn is_productive(&self, _output: &Value) -> bool {
        true
    }
}

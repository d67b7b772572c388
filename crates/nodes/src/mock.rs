//! `MockNode` — a test double for `ExecutableNode`.
//!
//! Useful in unit and integration tests where a real executor (Gmail,
//! Trello, Asana, …) is either unavailable or irrelevant.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{ExecutableNode, ExecutionContext, NodeError};

/// Behaviour injected into `MockNode` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Fail with the given error.
    Fail(NodeError),
    /// Panic inside `execute`.
    Panic(String),
    /// Sleep for the given duration, then return `{}`.
    Hang(Duration),
}

/// A mock node that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// What the node will do when `execute` is called.
    pub behaviour: MockBehaviour,
    /// When set, the output must carry a non-empty array under this key
    /// to count as productive.
    pub productive_key: Option<String>,
    /// All contexts seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<ExecutionContext>>>,
}

impl MockNode {
    fn with_behaviour(name: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            productive_key: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given value.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self::with_behaviour(name, MockBehaviour::ReturnValue(value))
    }

    /// Create a mock that always fails with an executor failure.
    pub fn failing(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Fail(NodeError::Failed(msg.into())))
    }

    /// Create a mock that always fails with the given error.
    pub fn failing_with(name: impl Into<String>, err: NodeError) -> Self {
        Self::with_behaviour(name, MockBehaviour::Fail(err))
    }

    /// Create a mock that panics when executed.
    pub fn panicking(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Panic(msg.into()))
    }

    /// Create a mock that takes `delay` to finish.
    pub fn hanging(name: impl Into<String>, delay: Duration) -> Self {
        Self::with_behaviour(name, MockBehaviour::Hang(delay))
    }

    /// Require a non-empty array under `key` for the output to be productive.
    pub fn productive_when(mut self, key: impl Into<String>) -> Self {
        self.productive_key = Some(key.into());
        self
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Inputs received on the most recent call.
    pub fn last_inputs(&self) -> Option<Vec<Value>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|ctx| ctx.inputs.clone())
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ctx.clone());

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => {
                // Tag the output with the node name so tests can trace which
                // mock produced it.
                let mut out = json!({ "node": self.name });
                if let (Some(out_obj), Some(v_obj)) = (out.as_object_mut(), v.as_object()) {
                    for (k, val) in v_obj {
                        out_obj.insert(k.clone(), val.clone());
                    }
                }
                Ok(out)
            }
            MockBehaviour::Fail(err) => Err(err.clone()),
            MockBehaviour::Panic(msg) => panic!("{msg}"),
            MockBehaviour::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(json!({}))
            }
        }
    }

    fn is_productive(&self, output: &Value) -> bool {
        match &self.productive_key {
            Some(key) => output
                .get(key)
                .and_then(Value::as_array)
                .is_some_and(|items| !items.is_empty()),
            None => true,
        }
    }
}

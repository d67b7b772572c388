//! Subtype → executor registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builtin::{ConditionNode, ManualTrigger};
use crate::ExecutableNode;

/// Maps subtype strings to shared `ExecutableNode` implementations.
pub type NodeRegistry = HashMap<String, Arc<dyn ExecutableNode>>;

/// Registry pre-populated with the executors that ship with this crate.
///
/// Integrations that talk to third-party services (Gmail, Trello, Asana)
/// are registered by the embedding application on top of this.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry: NodeRegistry = HashMap::new();
    registry.insert("manual-trigger".into(), Arc::new(ManualTrigger));
    registry.insert("condition".into(), Arc::new(ConditionNode));
    registry
}

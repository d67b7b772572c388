//! Built-in executors that need no external service.

pub mod condition;
pub mod manual;

pub use condition::ConditionNode;
pub use manual::ManualTrigger;

//! `manual-trigger` — fires once when the user presses "run".

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::{ExecutableNode, ExecutionContext, NodeError};

/// Trigger that emits a single event stamped with the current time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualTrigger;

#[async_trait]
impl ExecutableNode for ManualTrigger {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        Ok(json!({
            "items": [{
                "source": "manual",
                "runId": ctx.run_id.to_string(),
                "triggeredAt": Utc::now().to_rfc3339(),
            }]
        }))
    }
}

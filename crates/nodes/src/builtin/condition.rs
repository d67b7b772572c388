//! `condition` — evaluates a list of field comparisons against upstream output.
//!
//! The node does not branch; it reports whether every condition held so
//! downstream executors (and the run record) can see the verdict.
//!
//! The config arrives as raw JSON. This crate does not know the engine's
//! typed node config, and any holder of a `NodeRegistry` may call the
//! executor directly, so an omitted operator reads as `equals` and an
//! operator name outside the supported set is an executor failure.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{ExecutableNode, ExecutionContext, NodeError};

/// Logic executor for `condition` nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConditionNode;

#[async_trait]
impl ExecutableNode for ConditionNode {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let conditions = ctx
            .config
            .get("conditions")
            .and_then(Value::as_array)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| NodeError::MissingConfig("condition node has no conditions".into()))?;

        let subject = merge_inputs(&ctx.inputs);
        let mut results = Vec::with_capacity(conditions.len());

        for condition in conditions {
            let field = condition
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| NodeError::MissingConfig("condition without a field".into()))?;
            let operator = condition
                .get("operator")
                .and_then(Value::as_str)
                .unwrap_or("equals");
            let expected = condition.get("value").unwrap_or(&Value::Null);

            let actual = lookup(&subject, field);
            let held = evaluate(operator, actual, expected)?;
            debug!(node_id = %ctx.node_id, field, operator, held, "condition evaluated");
            results.push(held);
        }

        Ok(json!({
            "passed": results.iter().all(|r| *r),
            "results": results,
        }))
    }
}

/// Fold every predecessor output into one object; later inputs win.
fn merge_inputs(inputs: &[Value]) -> Value {
    let mut merged = Map::new();
    for input in inputs {
        if let Some(obj) = input.as_object() {
            for (k, v) in obj {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    Value::Object(merged)
}

/// Resolve a dotted path (`email.subject`) against a JSON value.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        other => other.get(segment),
    })
}

fn evaluate(operator: &str, actual: Option<&Value>, expected: &Value) -> Result<bool, NodeError> {
    let held = match operator {
        "exists" => actual.is_some_and(|v| !v.is_null()),
        "equals" => actual == Some(expected),
        "not_equals" => actual != Some(expected),
        "contains" => match (actual, expected) {
            (Some(Value::String(s)), Value::String(needle)) => {
                s.to_lowercase().contains(&needle.to_lowercase())
            }
            (Some(Value::Array(items)), needle) => items.contains(needle),
            _ => false,
        },
        "greater_than" => compare(actual, expected).is_some_and(|o| o.is_gt()),
        "less_than" => compare(actual, expected).is_some_and(|o| o.is_lt()),
        other => return Err(NodeError::Failed(format!("unknown condition operator '{other}'"))),
    };
    Ok(held)
}

fn compare(actual: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
    let a = actual?.as_f64()?;
    let b = expected.as_f64()?;
    a.partial_cmp(&b)
}

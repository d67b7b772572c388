//! Saving and loading graphs through a [`GraphStore`].
//!
//! A saved record carries the graph alongside its execution order and level
//! decomposition, computed at save time.

use chrono::Utc;
use tracing::info;

use db::{GraphStore, WorkflowRecord};

use crate::dag::SchedulePlan;
use crate::models::GraphModel;
use crate::EngineError;

/// Persist `graph` under `id`, replacing whatever was stored there.
pub async fn save_graph(
    store: &dyn GraphStore,
    id: &str,
    graph: &GraphModel,
) -> Result<WorkflowRecord, EngineError> {
    let plan = SchedulePlan::for_graph(graph);
    let record = WorkflowRecord {
        id: id.to_owned(),
        definition: serde_json::to_value(graph)?,
        execution_order: plan.execution_order,
        dag_structure: plan.dag_structure,
        saved_at: Utc::now(),
    };
    store.save_workflow(record.clone()).await?;
    info!(
        "Saved workflow '{}' ({} nodes, {} levels)",
        id,
        graph.nodes.len(),
        record.dag_structure.len()
    );
    Ok(record)
}

/// Load the graph stored under `id`.
pub async fn load_graph(store: &dyn GraphStore, id: &str) -> Result<GraphModel, EngineError> {
    let record = store.load_workflow(id).await?;
    Ok(serde_json::from_value(record.definition)?)
}

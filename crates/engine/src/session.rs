//! `EditorSession` — the per-session service that owns the live graph.
//!
//! Structural edits go through the session so the operations stack stays in
//! step with the graph. Validation and scheduling read a snapshot; running
//! borrows the session mutably, so no edit can land while a run is in
//! flight.

use tracing::{debug, info};

use crate::dag::SchedulePlan;
use crate::executor::{CancellationFlag, WorkflowExecutor};
use crate::models::{Edge, GraphModel, Node};
use crate::operations::{InverseAction, OperationsStack, UndoAction};
use crate::run::ExecutionRun;
use crate::validation::{ValidationEngine, ValidationReport};
use crate::EngineError;

pub struct EditorSession {
    graph: GraphModel,
    operations: OperationsStack,
    validator: ValidationEngine,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(ValidationEngine::default())
    }
}

impl EditorSession {
    pub fn new(validator: ValidationEngine) -> Self {
        Self::from_graph(GraphModel::default(), validator)
    }

    /// Open an existing graph. The history starts empty.
    pub fn from_graph(graph: GraphModel, validator: ValidationEngine) -> Self {
        Self {
            graph,
            operations: OperationsStack::new(),
            validator,
        }
    }

    /// Replace the default history bound.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.operations = OperationsStack::with_limit(limit);
        self
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn operations(&self) -> &OperationsStack {
        &self.operations
    }

    /// Add a node with the edges that should connect it.
    ///
    /// Edges whose other endpoint is missing are dropped; the recorded
    /// operation holds only the edges that actually landed.
    pub fn add_node(&mut self, node: Node, edges: Vec<Edge>) -> Result<(), EngineError> {
        if self.graph.contains(&node.id) {
            return Err(EngineError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        self.graph.insert_node(node.clone(), edges);
        let landed = self.graph.incident_edges(&id);
        debug!("added node '{}' with {} edge(s)", id, landed.len());
        self.operations.record_addition(node, landed);
        Ok(())
    }

    /// Connect two existing nodes. Not recorded in the operations history.
    ///
    /// Edge ids must be unique: a restore after undo keys edges by id.
    pub fn connect(&mut self, edge: Edge) -> Result<(), EngineError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.graph.contains(endpoint) {
                return Err(EngineError::UnknownNode(endpoint.clone()));
            }
        }
        if self.graph.edges.iter().any(|e| e.id == edge.id) {
            return Err(EngineError::DuplicateEdge(edge.id));
        }
        self.graph.edges.push(edge);
        Ok(())
    }

    /// Delete a node and every edge touching it.
    pub fn delete_node(&mut self, node_id: &str) -> Result<Node, EngineError> {
        let (node, edges) = self
            .graph
            .remove_node(node_id)
            .ok_or_else(|| EngineError::UnknownNode(node_id.to_owned()))?;
        debug!("deleted node '{}' with {} edge(s)", node_id, edges.len());
        self.operations.record_deletion(node.clone(), edges);
        Ok(node)
    }

    /// Reverse the most recent structural operation.
    ///
    /// Returns the applied inverse, or `None` when there is nothing to undo.
    /// A restore skips edges whose other endpoint has since been deleted.
    pub fn undo(&mut self) -> Option<UndoAction> {
        let action = self.operations.undo_last()?;
        match action.reverse {
            InverseAction::RemoveNode => {
                self.graph.remove_node(&action.node.id);
            }
            InverseAction::RestoreNode => {
                self.graph.insert_node(action.node.clone(), action.edges.clone());
            }
        }
        info!("undo: {:?} '{}'", action.reverse, action.node.id);
        Some(action)
    }

    /// Bring back a deleted node without unwinding anything done since.
    ///
    /// The node is looked up among the recorded deletions (newest first)
    /// and re-added as a fresh operation, so it can itself be undone.
    pub fn recover_deleted(&mut self, node_id: &str) -> Result<Node, EngineError> {
        let deleted = self
            .operations
            .peek_recent_deletions(self.operations.len())
            .into_iter()
            .find(|d| d.node.id == node_id)
            .ok_or_else(|| EngineError::UnknownNode(node_id.to_owned()))?;

        let node = deleted.node.clone();
        self.add_node(deleted.node, deleted.edges)?;
        info!("recovered node '{}' deleted at {}", node_id, deleted.deleted_at);
        Ok(node)
    }

    pub fn validate(&self) -> ValidationReport {
        self.validator.validate(&self.graph)
    }

    pub fn plan(&self) -> SchedulePlan {
        SchedulePlan::for_graph(&self.graph)
    }

    /// Run the current graph. Holding `&mut self` keeps edits out until the
    /// run has finished.
    pub async fn run(
        &mut self,
        executor: &WorkflowExecutor,
        cancel: &CancellationFlag,
    ) -> Result<ExecutionRun, EngineError> {
        executor.run(&self.graph, cancel).await
    }

    /// Start over with an empty graph and an empty history.
    pub fn new_workflow(&mut self) {
        self.graph = GraphModel::default();
        self.operations.clear();
    }
}

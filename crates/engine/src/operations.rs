//! Operation history for structural edits.
//!
//! Separate from any snapshot-based undo/redo: each entry is a node add or
//! delete together with the edges that touched the node at the time. The
//! stack only records intent; applying the inverse to a live graph is the
//! caller's job (see `EditorSession::undo`).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Edge, Node};

/// Default number of operations kept before the oldest is dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Add,
    Delete,
}

/// A recorded structural edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOperation {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub node: Node,
    pub connected_edges: Vec<Edge>,
    pub timestamp: DateTime<Utc>,
}

/// What the caller must do to reverse an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InverseAction {
    /// Undoing an add: take the node (and its current edges) out again.
    RemoveNode,
    /// Undoing a delete: put the node and its edges back.
    RestoreNode,
}

/// Result of [`OperationsStack::undo_last`].
#[derive(Debug, Clone, PartialEq)]
pub struct UndoAction {
    pub reverse: InverseAction,
    pub node: Node,
    pub edges: Vec<Edge>,
}

/// A deleted node as it looked when it was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedNode {
    pub node: Node,
    pub edges: Vec<Edge>,
    pub deleted_at: DateTime<Utc>,
}

/// Bounded LIFO history of node operations.
#[derive(Debug, Clone)]
pub struct OperationsStack {
    operations: VecDeque<NodeOperation>,
    limit: usize,
}

impl Default for OperationsStack {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationsStack {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Keep at most `limit` operations (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            operations: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn record_addition(&mut self, node: Node, edges: Vec<Edge>) {
        self.push(OperationType::Add, node, edges);
    }

    pub fn record_deletion(&mut self, node: Node, edges: Vec<Edge>) {
        self.push(OperationType::Delete, node, edges);
    }

    fn push(&mut self, op_type: OperationType, node: Node, connected_edges: Vec<Edge>) {
        debug!("recording {:?} of node '{}' ({} edges)", op_type, node.id, connected_edges.len());
        self.operations.push_back(NodeOperation {
            op_type,
            node,
            connected_edges,
            timestamp: Utc::now(),
        });
        while self.operations.len() > self.limit {
            self.operations.pop_front();
        }
    }

    /// Pop the most recent operation and return its inverse.
    ///
    /// Returns `None` on an empty stack.
    pub fn undo_last(&mut self) -> Option<UndoAction> {
        let op = self.operations.pop_back()?;
        let reverse = match op.op_type {
            OperationType::Add => InverseAction::RemoveNode,
            OperationType::Delete => InverseAction::RestoreNode,
        };
        Some(UndoAction {
            reverse,
            node: op.node,
            edges: op.connected_edges,
        })
    }

    /// The `n` most recent deletions, newest first, without popping anything.
    pub fn peek_recent_deletions(&self, n: usize) -> Vec<DeletedNode> {
        self.operations
            .iter()
            .rev()
            .filter(|op| op.op_type == OperationType::Delete)
            .take(n)
            .map(|op| DeletedNode {
                node: op.node.clone(),
                edges: op.connected_edges.clone(),
                deleted_at: op.timestamp,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NodeOperation> {
        self.operations.iter()
    }
}

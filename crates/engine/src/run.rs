//! Execution run record and per-node status types.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Error,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running   => write!(f, "running"),
            Self::Success   => write!(f, "success"),
            Self::Error     => write!(f, "error"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Live status of a node on the canvas: `idle → running → {success | error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Idle,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeResultStatus {
    Success,
    Error,
}

/// Why a node failed. Every kind is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    ConfigurationMissing,
    AuthorizationMissing,
    ExecutorFailure,
    UnexpectedException,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
    pub kind: FailureKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// NodeResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: String,
    pub status: NodeResultStatus,
    /// Wall time spent in the executor, in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NodeFailure>,
}

impl NodeResult {
    pub fn success(node_id: impl Into<String>, duration_ms: u64, output: Value) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeResultStatus::Success,
            duration_ms,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(
        node_id: impl Into<String>,
        duration_ms: u64,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeResultStatus::Error,
            duration_ms,
            output: None,
            error: Some(NodeFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == NodeResultStatus::Success
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

// ---------------------------------------------------------------------------
// ExecutionRun
// ---------------------------------------------------------------------------

/// One walk of the execution order.
///
/// Created with `status = running`; once sealed with a final status every
/// further mutation is ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRun {
    id: Uuid,
    start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
    status: RunStatus,
    node_results: Vec<NodeResult>,
    completed_count: usize,
    error_count: usize,
    /// Nodes that were never executed (cancelled, or not schedulable).
    skipped: Vec<String>,
}

impl ExecutionRun {
    pub(crate) fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            status: RunStatus::Running,
            node_results: Vec::new(),
            completed_count: 0,
            error_count: 0,
            skipped: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, result: NodeResult) {
        if self.is_sealed() {
            return;
        }
        if result.is_success() {
            self.completed_count += 1;
        } else {
            self.error_count += 1;
        }
        self.node_results.push(result);
    }

    pub(crate) fn skip(&mut self, node_ids: impl IntoIterator<Item = String>) {
        if !self.is_sealed() {
            self.skipped.extend(node_ids);
        }
    }

    pub(crate) fn seal(&mut self, status: RunStatus) {
        if self.is_sealed() || status == RunStatus::Running {
            return;
        }
        self.status = status;
        self.end_time = Some(Utc::now());
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_sealed(&self) -> bool {
        self.status != RunStatus::Running
    }

    pub fn node_results(&self) -> &[NodeResult] {
        &self.node_results
    }

    pub fn result_for(&self, node_id: &str) -> Option<&NodeResult> {
        self.node_results.iter().find(|r| r.node_id == node_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

// ---------------------------------------------------------------------------
// StatusBoard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BoardState {
    statuses: HashMap<String, NodeStatus>,
    generation: u64,
}

/// Shared, observable per-node status map.
///
/// Each run bumps the generation; a delayed reset only applies if no newer
/// run has started since it was scheduled.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<BoardState>>,
}

impl StatusBoard {
    fn lock(&self) -> std::sync::MutexGuard<'_, BoardState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new generation with every node idle.
    pub(crate) fn begin<'a>(&self, node_ids: impl IntoIterator<Item = &'a str>) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.statuses = node_ids
            .into_iter()
            .map(|id| (id.to_owned(), NodeStatus::Idle))
            .collect();
        state.generation
    }

    pub(crate) fn set(&self, node_id: &str, status: NodeStatus) {
        self.lock().statuses.insert(node_id.to_owned(), status);
    }

    /// Put every node back to idle, unless a newer run has begun.
    pub(crate) fn reset_if_current(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        for status in state.statuses.values_mut() {
            *status = NodeStatus::Idle;
        }
        true
    }

    pub fn get(&self, node_id: &str) -> Option<NodeStatus> {
        self.lock().statuses.get(node_id).copied()
    }

    pub fn snapshot(&self) -> HashMap<String, NodeStatus> {
        self.lock().statuses.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sealed_run_ignores_further_mutation() {
        let mut run = ExecutionRun::start();
        run.record(NodeResult::success("a", 3, json!({})));
        run.seal(RunStatus::Success);
        let end = run.end_time();

        run.record(NodeResult::failure("b", 1, FailureKind::ExecutorFailure, "late"));
        run.seal(RunStatus::Error);
        run.skip(["c".to_string()]);

        assert_eq!(run.status(), RunStatus::Success);
        assert_eq!(run.completed_count(), 1);
        assert_eq!(run.error_count(), 0);
        assert_eq!(run.end_time(), end);
        assert!(run.skipped().is_empty());
    }

    #[test]
    fn sealing_with_running_is_ignored() {
        let mut run = ExecutionRun::start();
        run.seal(RunStatus::Running);
        assert!(!run.is_sealed());
        assert!(run.end_time().is_none());
    }

    #[test]
    fn node_result_serializes_duration_and_kebab_failure() {
        let result = NodeResult::failure("a", 12, FailureKind::AuthorizationMissing, "no token");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["nodeId"], "a");
        assert_eq!(json["duration"], 12);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["kind"], "authorization-missing");
        assert!(json.get("output").is_none());
    }

    #[test]
    fn stale_reset_does_not_clobber_newer_run() {
        let board = StatusBoard::default();
        let first = board.begin(["a"]);
        board.set("a", NodeStatus::Success);

        let second = board.begin(["a"]);
        board.set("a", NodeStatus::Running);

        assert!(!board.reset_if_current(first));
        assert_eq!(board.get("a"), Some(NodeStatus::Running));
        assert!(board.reset_if_current(second));
        assert_eq!(board.get("a"), Some(NodeStatus::Idle));
    }
}

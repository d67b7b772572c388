//! End-to-end tests for `WorkflowExecutor`.
//!
//! Every executor here is a `MockNode` (or a tiny purpose-built double), so
//! no third-party service is ever contacted. Mocks are registered under
//! their own custom subtype, which lets each test wire a different
//! behaviour to each node.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use nodes::mock::MockNode;
use nodes::{builtin_registry, ExecutableNode, ExecutionContext, NodeError, NodeRegistry};

use crate::auth::{Capability, CapabilityProvider, StaticCapabilities};
use crate::executor::{CancellationFlag, ExecutorConfig, WorkflowExecutor};
use crate::models::{Edge, GraphModel, Node, NodeKind};
use crate::node_config::{
    Condition, ConditionConfig, ConditionOperator, NodeConfig, TrelloActionConfig,
};
use crate::notify::{NotifyLevel, RecordingNotifier};
use crate::run::{FailureKind, NodeStatus, RunStatus};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn mock_node(id: &str, kind: NodeKind) -> Node {
    Node::new(id, kind, NodeConfig::custom(format!("mock-{id}")))
}

/// `ids[0]` is a trigger, the rest are actions, wired in a line.
fn chain(ids: &[&str]) -> GraphModel {
    let nodes = ids
        .iter()
        .enumerate()
        .map(|(i, id)| mock_node(id, if i == 0 { NodeKind::Trigger } else { NodeKind::Action }))
        .collect();
    let edges = ids.windows(2).map(|w| Edge::connect(w[0], w[1])).collect();
    GraphModel::new(nodes, edges)
}

fn executor() -> WorkflowExecutor {
    WorkflowExecutor::new(NodeRegistry::new(), ExecutorConfig::default())
}

/// Register `mock` under the subtype `mock_node(id, ..)` uses.
fn install(executor: &mut WorkflowExecutor, id: &str, mock: MockNode) -> Arc<MockNode> {
    let mock = Arc::new(mock);
    executor.register(format!("mock-{id}"), Arc::clone(&mock) as Arc<dyn ExecutableNode>);
    mock
}

/// Grants every capability on the first `allowed` checks, then none.
struct RevokedAfter {
    allowed: usize,
    checks: AtomicUsize,
}

#[async_trait]
impl CapabilityProvider for RevokedAfter {
    async fn has_capability(&self, _capability: Capability) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) < self.allowed
    }
}

/// Raises the cancellation flag from inside a node.
struct CancelsRun(CancellationFlag);

#[async_trait]
impl ExecutableNode for CancelsRun {
    async fn execute(&self, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
        self.0.cancel();
        Ok(json!({ "cancelled": true }))
    }
}

// ============================================================
// Successful runs
// ============================================================

#[tokio::test]
async fn linear_chain_runs_every_node_in_order() {
    let mut exec = executor();
    let t = install(&mut exec, "t", MockNode::returning("t", json!({ "items": [1] })));
    let a = install(&mut exec, "a", MockNode::returning("a", json!({ "step": 1 })));
    let b = install(&mut exec, "b", MockNode::returning("b", json!({ "step": 2 })));

    let run = exec.run(&chain(&["t", "a", "b"]), &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Success);
    assert!(run.end_time().is_some());
    assert_eq!(run.completed_count(), 3);
    assert_eq!(run.error_count(), 0);
    let order: Vec<&str> = run.node_results().iter().map(|r| r.node_id.as_str()).collect();
    assert_eq!(order, vec!["t", "a", "b"]);
    assert_eq!((t.call_count(), a.call_count(), b.call_count()), (1, 1, 1));
}

#[tokio::test]
async fn node_receives_predecessor_outputs() {
    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({ "items": ["mail"] })));
    let a = install(&mut exec, "a", MockNode::returning("a", json!({})));

    exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();

    assert_eq!(a.last_inputs(), Some(vec![json!({ "node": "t", "items": ["mail"] })]));
}

#[tokio::test]
async fn builtin_manual_trigger_feeds_condition() {
    let condition = Node::new(
        "c",
        NodeKind::Logic,
        NodeConfig::Condition(ConditionConfig {
            conditions: vec![Condition {
                field: "items.0.source".into(),
                operator: ConditionOperator::Equals,
                value: Some(json!("manual")),
            }],
        }),
    );
    let graph = GraphModel::new(
        vec![Node::new("t", NodeKind::Trigger, NodeConfig::ManualTrigger), condition],
        vec![Edge::connect("t", "c")],
    );
    let exec = WorkflowExecutor::new(builtin_registry(), ExecutorConfig::default());

    let run = exec.run(&graph, &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Success);
    let verdict = run.result_for("c").and_then(|r| r.output.clone()).unwrap();
    assert_eq!(verdict["passed"], true);
}

#[tokio::test]
async fn nodes_outside_trigger_reach_are_skipped() {
    // `l` is a logic node with no predecessor: never a root of the execution order.
    let mut graph = chain(&["t", "a"]);
    graph.nodes.push(mock_node("l", NodeKind::Logic));

    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({})));
    install(&mut exec, "a", MockNode::returning("a", json!({})));
    let l = install(&mut exec, "l", MockNode::returning("l", json!({})));

    let run = exec.run(&graph, &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Success);
    assert_eq!(run.skipped(), ["l".to_string()]);
    assert_eq!(l.call_count(), 0);
}

// ============================================================
// Failures stop the run
// ============================================================

#[tokio::test]
async fn failing_action_ends_run_with_error() {
    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({ "items": [1] })));
    install(&mut exec, "a", MockNode::failing("a", "board not found"));
    let never = install(&mut exec, "n", MockNode::returning("n", json!({})));

    let run = exec.run(&chain(&["t", "a", "n"]), &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Error);
    assert_eq!(run.completed_count(), 1);
    assert_eq!(run.error_count(), 1);
    let failed = run.result_for("a").unwrap();
    assert!(!failed.is_success());
    assert_eq!(failed.failure_kind(), Some(FailureKind::ExecutorFailure));
    assert_eq!(failed.error.as_ref().unwrap().message, "board not found");
    assert_eq!(never.call_count(), 0);
    assert_eq!(run.skipped(), ["n".to_string()]);
    assert_eq!(exec.statuses().get("a"), Some(NodeStatus::Error));
    assert_eq!(exec.statuses().get("n"), Some(NodeStatus::Idle));
}

#[tokio::test]
async fn unproductive_trigger_fails_the_run() {
    let mut exec = executor();
    install(
        &mut exec,
        "t",
        MockNode::returning("t", json!({ "items": [] })).productive_when("items"),
    );
    let a = install(&mut exec, "a", MockNode::returning("a", json!({})));

    let run = exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Error);
    assert_eq!(run.completed_count(), 0);
    let result = run.result_for("t").unwrap();
    assert_eq!(result.failure_kind(), Some(FailureKind::ExecutorFailure));
    assert!(result.error.as_ref().unwrap().message.contains("produced no results"));
    assert_eq!(result.output.as_ref().unwrap()["items"], json!([]));
    assert_eq!(a.call_count(), 0);
}

#[tokio::test]
async fn node_errors_map_onto_failure_kinds() {
    let cases = [
        (NodeError::MissingConfig("no list".into()), FailureKind::ConfigurationMissing),
        (NodeError::Unauthorized("token expired".into()), FailureKind::AuthorizationMissing),
        (NodeError::Failed("429".into()), FailureKind::ExecutorFailure),
    ];
    for (err, kind) in cases {
        let mut exec = executor();
        install(&mut exec, "t", MockNode::returning("t", json!({})));
        install(&mut exec, "a", MockNode::failing_with("a", err));

        let run = exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();
        assert_eq!(run.result_for("a").unwrap().failure_kind(), Some(kind));
    }
}

#[tokio::test]
async fn panicking_executor_is_an_unexpected_exception() {
    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({})));
    install(&mut exec, "a", MockNode::panicking("a", "index out of bounds"));

    let run = exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Error);
    let result = run.result_for("a").unwrap();
    assert_eq!(result.failure_kind(), Some(FailureKind::UnexpectedException));
    assert!(result.error.as_ref().unwrap().message.contains("index out of bounds"));
}

#[tokio::test]
async fn missing_executor_is_an_executor_failure() {
    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({})));

    let run = exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();

    let result = run.result_for("a").unwrap();
    assert_eq!(result.failure_kind(), Some(FailureKind::ExecutorFailure));
    assert!(result.error.as_ref().unwrap().message.contains("mock-a"));
}

#[tokio::test(start_paused = true)]
async fn slow_executor_times_out() {
    let config = ExecutorConfig {
        node_timeout_ms: Some(50),
        ..ExecutorConfig::default()
    };
    let mut exec = WorkflowExecutor::new(NodeRegistry::new(), config);
    install(&mut exec, "t", MockNode::hanging("t", Duration::from_secs(10)));

    let graph = GraphModel::new(vec![mock_node("t", NodeKind::Trigger)], vec![]);
    let run = exec.run(&graph, &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Error);
    let result = run.result_for("t").unwrap();
    assert_eq!(result.failure_kind(), Some(FailureKind::ExecutorFailure));
    assert!(result.error.as_ref().unwrap().message.contains("timed out"));
}

// ============================================================
// Refusals: nothing runs, nothing changes
// ============================================================

#[tokio::test]
async fn empty_graph_is_refused() {
    let exec = executor();
    let err = exec.run(&GraphModel::default(), &CancellationFlag::new()).await.unwrap_err();
    assert!(matches!(err, EngineError::NothingToExecute));
}

#[tokio::test]
async fn disconnected_action_is_refused_before_anything_runs() {
    let mut graph = chain(&["t", "a"]);
    graph.nodes.push(mock_node("orphan", NodeKind::Action));

    let notifier = Arc::new(RecordingNotifier::new());
    let mut exec = executor().with_notifier(notifier.clone());
    let t = install(&mut exec, "t", MockNode::returning("t", json!({})));

    let err = exec.run(&graph, &CancellationFlag::new()).await.unwrap_err();

    assert!(matches!(
        &err,
        EngineError::DisconnectedActions(ids) if ids == &["orphan".to_string()]
    ));
    assert_eq!(t.call_count(), 0);
    assert!(exec.statuses().snapshot().is_empty());
    assert_eq!(notifier.levels(), vec![NotifyLevel::Warning]);
}

#[tokio::test]
async fn trigger_and_unwired_action_produce_no_results() {
    let graph = GraphModel::new(
        vec![mock_node("T", NodeKind::Trigger), mock_node("A", NodeKind::Action)],
        vec![],
    );
    let mut exec = executor();
    let t = install(&mut exec, "T", MockNode::returning("T", json!({})));
    let a = install(&mut exec, "A", MockNode::returning("A", json!({})));

    let err = exec.run(&graph, &CancellationFlag::new()).await.unwrap_err();

    assert_eq!(err.to_string(), "disconnected action nodes: A");
    assert_eq!(t.call_count() + a.call_count(), 0);
}

#[tokio::test]
async fn actions_caught_in_a_cycle_are_refused() {
    // t → a → b → a: both actions have an incoming edge, but neither is
    // ever released by the trigger-seeded walk.
    let graph = GraphModel::new(
        vec![
            mock_node("t", NodeKind::Trigger),
            mock_node("a", NodeKind::Action),
            mock_node("b", NodeKind::Action),
        ],
        vec![Edge::connect("t", "a"), Edge::connect("a", "b"), Edge::connect("b", "a")],
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let mut exec = executor().with_notifier(notifier.clone());
    let t = install(&mut exec, "t", MockNode::returning("t", json!({})));
    let a = install(&mut exec, "a", MockNode::returning("a", json!({})));

    let err = exec.run(&graph, &CancellationFlag::new()).await.unwrap_err();

    assert!(matches!(&err, EngineError::UnscheduledActions(ids) if ids == &["a", "b"]));
    assert_eq!(t.call_count() + a.call_count(), 0);
    assert!(exec.statuses().snapshot().is_empty());
    assert_eq!(notifier.levels(), vec![NotifyLevel::Warning]);
}

#[tokio::test]
async fn action_fed_only_by_a_logic_root_is_refused() {
    let mut graph = chain(&["t", "a"]);
    graph.nodes.push(mock_node("l", NodeKind::Logic));
    graph.nodes.push(mock_node("x", NodeKind::Action));
    graph.edges.push(Edge::connect("l", "x"));

    let mut exec = executor();
    let t = install(&mut exec, "t", MockNode::returning("t", json!({})));

    let err = exec.run(&graph, &CancellationFlag::new()).await.unwrap_err();

    assert!(matches!(&err, EngineError::UnscheduledActions(ids) if ids == &["x"]));
    assert_eq!(err.to_string(), "action nodes not reachable from any trigger: x");
    assert_eq!(t.call_count(), 0);
}

#[tokio::test]
async fn repeated_node_id_is_refused() {
    let mut graph = chain(&["t", "a"]);
    graph.nodes.push(mock_node("a", NodeKind::Action));

    let mut exec = executor();
    let t = install(&mut exec, "t", MockNode::returning("t", json!({})));
    let a = install(&mut exec, "a", MockNode::returning("a", json!({})));

    let err = exec.run(&graph, &CancellationFlag::new()).await.unwrap_err();

    assert!(matches!(&err, EngineError::DuplicateNode(id) if id == "a"));
    assert_eq!(t.call_count() + a.call_count(), 0);
    assert!(exec.statuses().snapshot().is_empty());
}

#[tokio::test]
async fn missing_authorization_is_refused() {
    let trello = Node::new(
        "a",
        NodeKind::Action,
        NodeConfig::TrelloAction(TrelloActionConfig::default()),
    );
    let graph = GraphModel::new(
        vec![mock_node("t", NodeKind::Trigger), trello],
        vec![Edge::connect("t", "a")],
    );

    let mut exec =
        executor().with_capabilities(Arc::new(StaticCapabilities::new([Capability::Gmail])));
    let t = install(&mut exec, "t", MockNode::returning("t", json!({})));

    let err = exec.run(&graph, &CancellationFlag::new()).await.unwrap_err();

    assert!(matches!(
        &err,
        EngineError::AuthorizationRequired(caps) if caps == &[Capability::Trello]
    ));
    assert_eq!(err.to_string(), "authorization required: trello");
    assert_eq!(t.call_count(), 0);
}

#[tokio::test]
async fn authorization_is_rechecked_per_node() {
    let trello = Node::new(
        "a",
        NodeKind::Action,
        NodeConfig::TrelloAction(TrelloActionConfig::default()),
    );
    let graph = GraphModel::new(
        vec![mock_node("t", NodeKind::Trigger), trello],
        vec![Edge::connect("t", "a")],
    );

    // One check passes (preflight); the per-node check afterwards fails.
    let provider = RevokedAfter {
        allowed: 1,
        checks: AtomicUsize::new(0),
    };
    let mut exec = executor().with_capabilities(Arc::new(provider));
    install(&mut exec, "t", MockNode::returning("t", json!({})));
    let action = Arc::new(MockNode::returning("a", json!({})));
    exec.register("trello-action", Arc::clone(&action) as Arc<dyn ExecutableNode>);

    let run = exec.run(&graph, &CancellationFlag::new()).await.unwrap();

    assert_eq!(run.status(), RunStatus::Error);
    assert_eq!(
        run.result_for("a").unwrap().failure_kind(),
        Some(FailureKind::AuthorizationMissing)
    );
    assert_eq!(action.call_count(), 0);
}

// ============================================================
// Cancellation
// ============================================================

#[tokio::test]
async fn cancelling_mid_run_skips_the_rest_without_errors() {
    let cancel = CancellationFlag::new();
    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({})));
    exec.register("mock-a", Arc::new(CancelsRun(cancel.clone())));
    let b = install(&mut exec, "b", MockNode::returning("b", json!({})));

    let run = exec.run(&chain(&["t", "a", "b"]), &cancel).await.unwrap();

    assert_eq!(run.status(), RunStatus::Cancelled);
    assert_eq!(run.completed_count(), 2);
    assert_eq!(run.error_count(), 0);
    assert_eq!(run.skipped(), ["b".to_string()]);
    assert!(run.result_for("b").is_none());
    assert_eq!(b.call_count(), 0);
    assert_eq!(exec.statuses().get("b"), Some(NodeStatus::Idle));
}

#[tokio::test]
async fn pre_cancelled_flag_runs_nothing() {
    let cancel = CancellationFlag::new();
    cancel.cancel();
    let mut exec = executor();
    let t = install(&mut exec, "t", MockNode::returning("t", json!({})));

    let run = exec.run(&chain(&["t"]), &cancel).await.unwrap();

    assert_eq!(run.status(), RunStatus::Cancelled);
    assert!(run.node_results().is_empty());
    assert_eq!(t.call_count(), 0);
}

// ============================================================
// Status board and notifications
// ============================================================

#[tokio::test(start_paused = true)]
async fn statuses_reset_to_idle_after_grace() {
    let mut exec = executor();
    install(&mut exec, "t", MockNode::returning("t", json!({})));
    install(&mut exec, "a", MockNode::failing("a", "nope"));

    exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();
    assert_eq!(exec.statuses().get("t"), Some(NodeStatus::Success));
    assert_eq!(exec.statuses().get("a"), Some(NodeStatus::Error));

    tokio::time::sleep(exec.config().reset_grace() + Duration::from_millis(10)).await;

    assert_eq!(exec.statuses().get("t"), Some(NodeStatus::Idle));
    assert_eq!(exec.statuses().get("a"), Some(NodeStatus::Idle));
}

#[tokio::test]
async fn notifications_follow_run_lifecycle() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut exec = executor().with_notifier(notifier.clone());
    install(&mut exec, "t", MockNode::returning("t", json!({})));
    install(&mut exec, "a", MockNode::returning("a", json!({})));

    exec.run(&chain(&["t", "a"]), &CancellationFlag::new()).await.unwrap();
    assert_eq!(notifier.levels(), vec![NotifyLevel::Info, NotifyLevel::Success]);

    let failing = Arc::new(RecordingNotifier::new());
    let mut exec = executor().with_notifier(failing.clone());
    install(&mut exec, "t", MockNode::failing("t", "inbox unavailable"));

    exec.run(&chain(&["t"]), &CancellationFlag::new()).await.unwrap();
    assert_eq!(failing.levels(), vec![NotifyLevel::Info, NotifyLevel::Error]);
    assert!(failing.notifications()[1].message.contains("inbox unavailable"));
}

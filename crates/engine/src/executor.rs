//! Workflow execution engine.
//!
//! `WorkflowExecutor` is the central orchestrator:
//! 1. Refuses to start on an empty graph, on repeated node ids, on action
//!    nodes no trigger reaches, or when a node needs a credential that is
//!    not held.
//! 2. Computes the trigger-seeded execution order.
//! 3. Walks it one node at a time, dispatching each node to the executor
//!    registered for its subtype and feeding it its predecessors' outputs.
//! 4. Stops at the first failure; there is no continue-past-error mode.
//! 5. Seals the `ExecutionRun` and, after a grace delay, puts every node
//!    status back to idle.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use nodes::{ExecutableNode, ExecutionContext, NodeError, NodeRegistry};

use crate::auth::{requires_authorization, Capability, CapabilityProvider, StaticCapabilities};
use crate::dag::execution_order;
use crate::models::{GraphModel, Node, NodeKind};
use crate::notify::{NoopNotifier, Notifier, NotifyLevel};
use crate::run::{ExecutionRun, FailureKind, NodeResult, NodeStatus, RunStatus, StatusBoard};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    /// How long node statuses stay visible after a run before resetting to idle.
    pub reset_grace_ms: u64,
    /// Upper bound on a single executor call. `None` waits indefinitely.
    pub node_timeout_ms: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            reset_grace_ms: 1500,
            node_timeout_ms: None,
        }
    }
}

impl ExecutorConfig {
    pub fn reset_grace(&self) -> Duration {
        Duration::from_millis(self.reset_grace_ms)
    }

    pub fn node_timeout(&self) -> Option<Duration> {
        self.node_timeout_ms.map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation, checked between nodes (never mid-call).
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// WorkflowExecutor
// ---------------------------------------------------------------------------

/// Runs workflow graphs against a registry of node executors.
///
/// Construct one per editing session and call [`WorkflowExecutor::run`]
/// with a graph snapshot.
pub struct WorkflowExecutor {
    registry: NodeRegistry,
    capabilities: Arc<dyn CapabilityProvider>,
    notifier: Arc<dyn Notifier>,
    config: ExecutorConfig,
    board: StatusBoard,
}

impl WorkflowExecutor {
    /// Create a new executor holding no capabilities and notifying no one.
    pub fn new(registry: NodeRegistry, config: ExecutorConfig) -> Self {
        Self {
            registry,
            capabilities: Arc::new(StaticCapabilities::default()),
            notifier: Arc::new(NoopNotifier),
            config,
            board: StatusBoard::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Arc<dyn CapabilityProvider>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Register (or replace) the executor for a subtype.
    pub fn register(&mut self, subtype: impl Into<String>, executor: Arc<dyn ExecutableNode>) {
        self.registry.insert(subtype.into(), executor);
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Live per-node statuses of the current (or most recent) run.
    pub fn statuses(&self) -> &StatusBoard {
        &self.board
    }

    /// Check the hard gates without running anything.
    ///
    /// # Errors
    /// - [`EngineError::NothingToExecute`] for an empty graph.
    /// - [`EngineError::DuplicateNode`] for the first repeated node id.
    /// - [`EngineError::DisconnectedActions`] naming action/AI nodes with no
    ///   incoming edge.
    /// - [`EngineError::UnscheduledActions`] naming action/AI nodes the
    ///   trigger-seeded order never reaches (cycles, logic-only roots).
    /// - [`EngineError::AuthorizationRequired`] listing capabilities that
    ///   are needed but not held.
    pub async fn preflight(&self, graph: &GraphModel) -> Result<(), EngineError> {
        if graph.is_empty() {
            return Err(EngineError::NothingToExecute);
        }

        let mut seen = HashSet::new();
        if let Some(dup) = graph.nodes.iter().find(|n| !seen.insert(n.id.as_str())) {
            return Err(EngineError::DuplicateNode(dup.id.clone()));
        }

        let runnable = |n: &&Node| matches!(n.kind, NodeKind::Action | NodeKind::Ai);

        let disconnected: Vec<String> = graph
            .nodes
            .iter()
            .filter(runnable)
            .filter(|n| graph.incoming_count(&n.id) == 0)
            .map(|n| n.id.clone())
            .collect();
        if !disconnected.is_empty() {
            return Err(EngineError::DisconnectedActions(disconnected));
        }

        let order = execution_order(graph);
        let scheduled: HashSet<&str> = order.iter().map(String::as_str).collect();
        let unscheduled: Vec<String> = graph
            .nodes
            .iter()
            .filter(runnable)
            .filter(|n| !scheduled.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        if !unscheduled.is_empty() {
            return Err(EngineError::UnscheduledActions(unscheduled));
        }

        let required: HashSet<Capability> =
            graph.nodes.iter().filter_map(requires_authorization).collect();
        let mut missing = Vec::new();
        for capability in required {
            if !self.capabilities.has_capability(capability).await {
                missing.push(capability);
            }
        }
        if !missing.is_empty() {
            missing.sort();
            return Err(EngineError::AuthorizationRequired(missing));
        }

        Ok(())
    }

    /// Run the graph and return the sealed run record.
    ///
    /// # Errors
    /// Only the pre-run refusals of [`WorkflowExecutor::preflight`]; a
    /// refused run touches no node status. Node failures are reported
    /// inside the returned `ExecutionRun`.
    #[instrument(
        skip(self, graph, cancel),
        fields(nodes = graph.nodes.len(), edges = graph.edges.len())
    )]
    pub async fn run(
        &self,
        graph: &GraphModel,
        cancel: &CancellationFlag,
    ) -> Result<ExecutionRun, EngineError> {
        if let Err(refusal) = self.preflight(graph).await {
            warn!("Run refused: {refusal}");
            let details = match &refusal {
                EngineError::DisconnectedActions(ids) | EngineError::UnscheduledActions(ids) => {
                    Some(json!({ "nodeIds": ids }))
                }
                EngineError::DuplicateNode(id) => Some(json!({ "nodeIds": [id] })),
                EngineError::AuthorizationRequired(caps) => Some(json!({ "capabilities": caps })),
                _ => None,
            };
            self.notifier.notify(NotifyLevel::Warning, &refusal.to_string(), details.as_ref());
            return Err(refusal);
        }

        let order = execution_order(graph);
        let mut run = ExecutionRun::start();
        let generation = self.board.begin(graph.nodes.iter().map(|n| n.id.as_str()));

        let scheduled: HashSet<&str> = order.iter().map(String::as_str).collect();
        let unscheduled: Vec<String> = graph
            .nodes
            .iter()
            .filter(|n| !scheduled.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        if !unscheduled.is_empty() {
            warn!(
                "{} node(s) cannot be scheduled and will not run: {:?}",
                unscheduled.len(),
                unscheduled
            );
            run.skip(unscheduled);
        }

        info!(run_id = %run.id(), "Executing {} nodes in order: {:?}", order.len(), order);
        self.notifier.notify(
            NotifyLevel::Info,
            "Workflow execution started",
            Some(&json!({ "runId": run.id(), "order": order })),
        );

        let node_map: HashMap<&str, &Node> =
            graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut outputs: HashMap<String, Value> = HashMap::new();
        let mut final_status = RunStatus::Success;

        for (step, node_id) in order.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(run_id = %run.id(), "Run cancelled before node '{}'", node_id);
                run.skip(order[step..].iter().cloned());
                final_status = RunStatus::Cancelled;
                break;
            }

            let Some(node) = node_map.get(node_id.as_str()).copied() else {
                continue;
            };

            self.board.set(node_id, NodeStatus::Running);
            let result = self.execute_node(run.id(), node, graph, &outputs).await;

            if result.is_success() {
                info!("node '{}' succeeded in {} ms", node_id, result.duration_ms);
                self.board.set(node_id, NodeStatus::Success);
                if let Some(output) = &result.output {
                    outputs.insert(node_id.clone(), output.clone());
                }
                run.record(result);
            } else {
                let message = result
                    .error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                error!("node '{}' failed: {}", node_id, message);
                self.board.set(node_id, NodeStatus::Error);
                self.notifier.notify(
                    NotifyLevel::Error,
                    &format!("Node '{}' failed: {}", node.label, message),
                    serde_json::to_value(&result).ok().as_ref(),
                );
                run.record(result);
                run.skip(order[step + 1..].iter().cloned());
                final_status = RunStatus::Error;
                break;
            }
        }

        run.seal(final_status);
        match final_status {
            RunStatus::Success => {
                info!(run_id = %run.id(), "Run succeeded ({} nodes)", run.completed_count());
                self.notifier.notify(
                    NotifyLevel::Success,
                    &format!("Workflow completed: {} node(s) succeeded", run.completed_count()),
                    None,
                );
            }
            RunStatus::Cancelled => {
                self.notifier.notify(NotifyLevel::Warning, "Workflow execution cancelled", None);
            }
            RunStatus::Error | RunStatus::Running => {}
        }

        self.schedule_reset(generation);
        Ok(run)
    }

    // -----------------------------------------------------------------------
    // Internal: execute a single node and classify the outcome.
    // -----------------------------------------------------------------------

    async fn execute_node(
        &self,
        run_id: Uuid,
        node: &Node,
        graph: &GraphModel,
        outputs: &HashMap<String, Value>,
    ) -> NodeResult {
        let started = Instant::now();
        let elapsed = |started: Instant| started.elapsed().as_millis() as u64;

        // Re-checked per node: a token can be revoked mid-run.
        if let Some(capability) = requires_authorization(node) {
            if !self.capabilities.has_capability(capability).await {
                return NodeResult::failure(
                    &node.id,
                    elapsed(started),
                    FailureKind::AuthorizationMissing,
                    format!("{capability} authorization is not held"),
                );
            }
        }

        let Some(executor) = self.registry.get(node.subtype()).cloned() else {
            return NodeResult::failure(
                &node.id,
                elapsed(started),
                FailureKind::ExecutorFailure,
                format!("no executor registered for subtype '{}'", node.subtype()),
            );
        };

        let ctx = ExecutionContext {
            run_id,
            node_id: node.id.clone(),
            subtype: node.subtype().to_owned(),
            label: node.label.clone(),
            config: node.config.to_value(),
            inputs: graph
                .incoming(&node.id)
                .filter_map(|e| outputs.get(&e.source).cloned())
                .collect(),
        };

        let task_executor = Arc::clone(&executor);
        let mut handle = tokio::spawn(async move { task_executor.execute(&ctx).await });

        let joined = match self.config.node_timeout() {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return NodeResult::failure(
                        &node.id,
                        elapsed(started),
                        FailureKind::ExecutorFailure,
                        format!("executor timed out after {} ms", limit.as_millis()),
                    );
                }
            },
            None => handle.await,
        };
        let duration_ms = elapsed(started);

        match joined {
            Ok(Ok(output)) if executor.is_productive(&output) => {
                NodeResult::success(&node.id, duration_ms, output)
            }
            Ok(Ok(output)) => NodeResult::failure(
                &node.id,
                duration_ms,
                FailureKind::ExecutorFailure,
                format!("'{}' completed but produced no results", node.label),
            )
            .with_output(output),
            Ok(Err(err)) => {
                let kind = match &err {
                    NodeError::MissingConfig(_) => FailureKind::ConfigurationMissing,
                    NodeError::Unauthorized(_) => FailureKind::AuthorizationMissing,
                    NodeError::Failed(_) => FailureKind::ExecutorFailure,
                };
                NodeResult::failure(&node.id, duration_ms, kind, err.to_string())
            }
            Err(join_err) => NodeResult::failure(
                &node.id,
                duration_ms,
                FailureKind::UnexpectedException,
                describe_join_error(join_err),
            ),
        }
    }

    fn schedule_reset(&self, generation: u64) {
        let board = self.board.clone();
        let grace = self.config.reset_grace();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            board.reset_if_current(generation);
        });
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return "executor task was cancelled".into();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("executor panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("executor panicked: {msg}")
    } else {
        "executor panicked".into()
    }
}

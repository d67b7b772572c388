//! Graph validation. Run this on every edit and before saving or running.
//!
//! [`ValidationEngine::validate`] is a pure function of the graph snapshot:
//! it never fails, never mutates its input, and produces the same report
//! for the same input. Checks run in a fixed order:
//!
//! 1. structure (empty graph, triggers, actions, isolation, reachability, cycles)
//! 2. configuration (per-subtype rules from the [`RuleRegistry`])
//! 3. connection (dangling endpoints, duplicates, action → trigger, fan-out)
//! 4. logic (dead-end actions, under-connected logic nodes)
//! 5. performance (graph size, trigger action fan-out)

pub mod connection;
pub mod issue;
pub mod logic;
pub mod performance;
pub mod rules;
pub mod structure;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{GraphModel, Node, NodeKind};

pub use issue::{IssueCategory, IssueType, Issues, Severity, ValidationIssue, ValidationReport};
pub use rules::{ConfigRule, RuleRegistry};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for the warning-level checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    /// More nodes than this draws a performance warning.
    pub max_nodes: usize,
    /// More outgoing edges than this on a trigger draws a connection warning.
    pub max_trigger_fanout: usize,
    /// More direct action children than this on a trigger draws a
    /// performance warning.
    pub max_trigger_action_children: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_nodes: 20,
            max_trigger_fanout: 3,
            max_trigger_action_children: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Indexed view of a graph snapshot
// ---------------------------------------------------------------------------

/// Index-based adjacency shared by the individual checks.
///
/// Only edges whose endpoints both resolve are part of `successors` and
/// `in_degree`; the connection checks report the rest.
pub struct GraphView<'a> {
    pub graph: &'a GraphModel,
    index: HashMap<&'a str, usize>,
    pub successors: Vec<Vec<usize>>,
    pub in_degree: Vec<usize>,
}

impl<'a> GraphView<'a> {
    pub fn new(graph: &'a GraphModel) -> Self {
        let mut index = HashMap::with_capacity(graph.nodes.len());
        for (i, node) in graph.nodes.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(i);
        }

        let mut successors = vec![Vec::new(); graph.nodes.len()];
        let mut in_degree = vec![0; graph.nodes.len()];
        for edge in &graph.edges {
            let endpoints = (index.get(edge.source.as_str()), index.get(edge.target.as_str()));
            if let (Some(&s), Some(&t)) = endpoints {
                successors[s].push(t);
                in_degree[t] += 1;
            }
        }

        Self {
            graph,
            index,
            successors,
            in_degree,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.nodes.is_empty()
    }

    pub fn node(&self, i: usize) -> &'a Node {
        &self.graph.nodes[i]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.index_of(id).map(|i| self.node(i).kind)
    }

    pub fn out_degree(&self, i: usize) -> usize {
        self.successors[i].len()
    }

    /// Indices of nodes of the given kind, in node array order.
    pub fn of_kind(&self, kind: NodeKind) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&i| self.node(i).kind == kind)
    }
}

// ---------------------------------------------------------------------------
// ValidationEngine
// ---------------------------------------------------------------------------

/// Runs every check against a graph snapshot.
///
/// Construct once per session; the rule registry is resolved at
/// construction time.
pub struct ValidationEngine {
    config: ValidationConfig,
    rules: RuleRegistry,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl ValidationEngine {
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_rules(config, RuleRegistry::with_defaults())
    }

    pub fn with_rules(config: ValidationConfig, rules: RuleRegistry) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(&self, graph: &GraphModel) -> ValidationReport {
        let view = GraphView::new(graph);
        let mut issues = Issues::default();

        structure::check(&view, &mut issues);
        for node in &graph.nodes {
            self.rules.rule_for(node.subtype()).check(node, &mut issues);
        }
        connection::check(&view, &self.config, &mut issues);
        logic::check(&view, &mut issues);
        performance::check(&view, &self.config, &mut issues);

        let report = ValidationReport::from_issues(issues.into_vec());
        debug!(
            "validated {} nodes / {} edges: {} errors, {} warnings, score {}",
            graph.nodes.len(),
            graph.edges.len(),
            report.errors.len(),
            report.warnings.len(),
            report.score
        );
        report
    }
}

/// Validate with default thresholds and rules.
pub fn validate(graph: &GraphModel) -> ValidationReport {
    ValidationEngine::default().validate(graph)
}

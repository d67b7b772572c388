//! Edge checks: endpoints resolve, no duplicate pairs, actions never feed
//! triggers, and triggers do not fan out too widely.

use std::collections::HashSet;

use super::{GraphView, IssueCategory, Issues, Severity, ValidationConfig, ValidationIssue};
use crate::models::NodeKind;

const CATEGORY: IssueCategory = IssueCategory::Connection;

pub fn check(view: &GraphView<'_>, config: &ValidationConfig, issues: &mut Issues) {
    let mut pairs: HashSet<(&str, &str)> = HashSet::new();

    for edge in &view.graph.edges {
        let source = view.kind_of(&edge.source);
        let target = view.kind_of(&edge.target);

        let endpoints = [("source", &edge.source, source), ("target", &edge.target, target)];
        for (side, id, kind) in endpoints {
            if kind.is_none() {
                issues.push(
                    ValidationIssue::error(
                        "dangling-edge",
                        CATEGORY,
                        Severity::Critical,
                        format!("Edge '{}' {side} '{id}' does not exist", edge.id),
                    )
                    .on_edge(&edge.id)
                    .suggest("Delete the edge or reconnect it"),
                );
            }
        }

        if !pairs.insert((edge.source.as_str(), edge.target.as_str())) {
            issues.push(
                ValidationIssue::error(
                    "duplicate-edge",
                    CATEGORY,
                    Severity::Medium,
                    format!("Duplicate connection from '{}' to '{}'", edge.source, edge.target),
                )
                .on_edge(&edge.id),
            );
        }

        if source == Some(NodeKind::Action) && target == Some(NodeKind::Trigger) {
            issues.push(
                ValidationIssue::error(
                    "action-feeds-trigger",
                    CATEGORY,
                    Severity::High,
                    format!(
                        "Action '{}' must not connect into trigger '{}'",
                        edge.source, edge.target
                    ),
                )
                .on_edge(&edge.id)
                .on_node(&edge.target)
                .suggest("Triggers start a workflow; they cannot be fed by actions"),
            );
        }
    }

    for t in view.of_kind(NodeKind::Trigger) {
        let fanout = view.out_degree(t);
        if fanout > config.max_trigger_fanout {
            let node = view.node(t);
            issues.push(
                ValidationIssue::warning(
                    "trigger-fanout",
                    CATEGORY,
                    Severity::Low,
                    format!(
                        "Trigger '{}' has {fanout} outgoing connections (more than {})",
                        node.label, config.max_trigger_fanout
                    ),
                )
                .on_node(&node.id),
            );
        }
    }
}

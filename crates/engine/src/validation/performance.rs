//! Size and fan-out heuristics. Warnings only.

use std::collections::HashSet;

use super::{GraphView, IssueCategory, Issues, Severity, ValidationConfig, ValidationIssue};
use crate::models::NodeKind;

const CATEGORY: IssueCategory = IssueCategory::Performance;

pub fn check(view: &GraphView<'_>, config: &ValidationConfig, issues: &mut Issues) {
    if view.len() > config.max_nodes {
        issues.push(
            ValidationIssue::warning(
                "too-many-nodes",
                CATEGORY,
                Severity::Low,
                format!("Workflow has {} nodes (more than {})", view.len(), config.max_nodes),
            )
            .suggest("Split it into smaller workflows"),
        );
    }

    for t in view.of_kind(NodeKind::Trigger) {
        let children: HashSet<usize> = view.successors[t]
            .iter()
            .copied()
            .filter(|&c| view.node(c).kind == NodeKind::Action)
            .collect();
        if children.len() > config.max_trigger_action_children {
            let node = view.node(t);
            issues.push(
                ValidationIssue::warning(
                    "trigger-action-fanout",
                    CATEGORY,
                    Severity::Medium,
                    format!("Trigger '{}' starts {} actions directly", node.label, children.len()),
                )
                .on_node(&node.id)
                .suggest("Sequence the actions through logic nodes"),
            );
        }
    }
}

//! Flow-shape checks: terminal actions and under-connected logic nodes.

use super::{GraphView, IssueCategory, Issues, Severity, ValidationIssue};
use crate::models::NodeKind;

const CATEGORY: IssueCategory = IssueCategory::Logic;

pub fn check(view: &GraphView<'_>, issues: &mut Issues) {
    for i in view.of_kind(NodeKind::Action) {
        if view.out_degree(i) == 0 {
            let node = view.node(i);
            // Terminal actions are fine; this is a note, not a problem.
            issues.push(
                ValidationIssue::info(
                    "dead-end-action",
                    CATEGORY,
                    format!("Action '{}' ends the workflow", node.label),
                )
                .on_node(&node.id),
            );
        }
    }

    for i in view.of_kind(NodeKind::Logic) {
        let out = view.out_degree(i);
        if out < 2 {
            let node = view.node(i);
            issues.push(
                ValidationIssue::warning(
                    "logic-branches",
                    CATEGORY,
                    Severity::Medium,
                    format!(
                        "Logic node '{}' has {out} outgoing connection(s); \
                         expected true and false branches",
                        node.label
                    ),
                )
                .on_node(&node.id)
                .suggest("Connect both the true and the false branch"),
            );
        }
    }
}

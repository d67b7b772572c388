//! Structural checks: presence of triggers and actions, isolation,
//! reachability from triggers, duplicate ids, and cycles.

use std::collections::{HashSet, VecDeque};

use super::{GraphView, IssueCategory, Issues, Severity, ValidationIssue};
use crate::models::NodeKind;

const CATEGORY: IssueCategory = IssueCategory::Structure;

pub fn check(view: &GraphView<'_>, issues: &mut Issues) {
    if view.is_empty() {
        issues.push(
            ValidationIssue::warning(
                "empty-graph",
                CATEGORY,
                Severity::Medium,
                "Workflow has no nodes",
            )
                .suggest("Add a trigger node to get started"),
        );
        no_trigger(issues);
        return;
    }

    duplicate_ids(view, issues);

    if view.of_kind(NodeKind::Trigger).next().is_none() {
        no_trigger(issues);
    }
    if view.of_kind(NodeKind::Action).next().is_none() {
        issues.push(
            ValidationIssue::warning(
                "no-action",
                CATEGORY,
                Severity::Medium,
                "Workflow has no action nodes",
            )
                .suggest("Add an action so the workflow does something"),
        );
    }

    isolated_nodes(view, issues);
    unreachable_nodes(view, issues);
    cycles(view, issues);
}

fn no_trigger(issues: &mut Issues) {
    issues.push(
        ValidationIssue::error(
            "no-trigger",
            CATEGORY,
            Severity::Critical,
            "Workflow must have at least one trigger node",
        )
            .suggest("Add a trigger such as an email or manual trigger"),
    );
}

fn duplicate_ids(view: &GraphView<'_>, issues: &mut Issues) {
    let mut seen = HashSet::new();
    for node in &view.graph.nodes {
        if !seen.insert(node.id.as_str()) {
            issues.push(
                ValidationIssue::error(
                    "duplicate-node-id",
                    CATEGORY,
                    Severity::Critical,
                    format!("Node id '{}' is used more than once", node.id),
                )
                .on_node(&node.id),
            );
        }
    }
}

fn isolated_nodes(view: &GraphView<'_>, issues: &mut Issues) {
    // Count dangling edges too: a node with a broken edge is not isolated,
    // it is misconnected, and the connection checks say so.
    let touched: HashSet<&str> = view
        .graph
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();

    for node in &view.graph.nodes {
        if !touched.contains(node.id.as_str()) {
            issues.push(
                ValidationIssue::warning(
                    "isolated-node",
                    CATEGORY,
                    Severity::Low,
                    format!("Node '{}' is not connected to anything", node.label),
                )
                .on_node(&node.id)
                .suggest("Connect it or remove it"),
            );
        }
    }
}

fn unreachable_nodes(view: &GraphView<'_>, issues: &mut Issues) {
    let mut reached = vec![false; view.len()];
    let mut queue: VecDeque<usize> = view.of_kind(NodeKind::Trigger).collect();
    for &t in &queue {
        reached[t] = true;
    }

    while let Some(node) = queue.pop_front() {
        for &next in &view.successors[node] {
            if !reached[next] {
                reached[next] = true;
                queue.push_back(next);
            }
        }
    }

    for (i, node) in view.graph.nodes.iter().enumerate() {
        if !node.is_trigger() && !reached[i] {
            issues.push(
                ValidationIssue::error(
                    "unreachable-node",
                    CATEGORY,
                    Severity::High,
                    format!("Node '{}' cannot be reached from any trigger", node.label),
                )
                .on_node(&node.id)
                .suggest("Connect it downstream of a trigger"),
            );
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search with an explicit recursion stack. Every back edge
/// closes a cycle; rotations of the same cycle are reported once.
pub fn find_cycles(view: &GraphView<'_>) -> Vec<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; view.len()];
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in 0..view.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::OnStack;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(&(node, child)) = stack.last() {
            let Some(&next) = view.successors[node].get(child) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::OnStack;
                    stack.push((next, 0));
                }
                Mark::OnStack => {
                    if let Some(pos) = stack.iter().position(|&(n, _)| n == next) {
                        let cycle: Vec<usize> = stack[pos..].iter().map(|&(n, _)| n).collect();
                        if seen.insert(canonical(&cycle)) {
                            cycles.push(cycle);
                        }
                    }
                }
                Mark::Done => {}
            }
        }
    }

    cycles
}

/// Rotate so the smallest index leads.
fn canonical(cycle: &[usize]) -> Vec<usize> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, n)| *n)
        .map_or(0, |(i, _)| i);
    cycle[start..].iter().chain(&cycle[..start]).copied().collect()
}

fn cycles(view: &GraphView<'_>, issues: &mut Issues) {
    for cycle in find_cycles(view) {
        let mut path: Vec<&str> = cycle.iter().map(|&i| view.node(i).id.as_str()).collect();
        let first = path[0];
        path.push(first);
        issues.push(
            ValidationIssue::error(
                "cycle",
                CATEGORY,
                Severity::Critical,
                format!("Cycle detected: {}", path.join(" → ")),
            )
            .on_node(first)
            .suggest("Remove one of the edges in the loop"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, GraphModel, Node};
    use crate::node_config::NodeConfig;
    use crate::validation::ValidationReport;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node::new(id, kind, NodeConfig::custom("mock")).with_label(id)
    }

    fn run(graph: &GraphModel) -> ValidationReport {
        let mut issues = Issues::default();
        check(&GraphView::new(graph), &mut issues);
        ValidationReport::from_issues(issues.into_vec())
    }

    fn codes_for<'a>(report: &'a ValidationReport, node_id: &'a str) -> Vec<&'a str> {
        report.issues_for_node(node_id).map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn isolated_action_is_warned_and_unreachable() {
        let graph = GraphModel::new(
            vec![
                node("t", NodeKind::Trigger),
                node("a", NodeKind::Action),
                node("lost", NodeKind::Action),
            ],
            vec![Edge::connect("t", "a")],
        );
        let report = run(&graph);
        assert_eq!(codes_for(&report, "lost"), vec!["unreachable-node", "isolated-node"]);
        assert!(codes_for(&report, "a").is_empty());
    }

    #[test]
    fn triggers_are_never_unreachable() {
        let graph = GraphModel::new(
            vec![
                node("t1", NodeKind::Trigger),
                node("t2", NodeKind::Trigger),
                node("a", NodeKind::Action),
            ],
            vec![Edge::connect("t1", "a"), Edge::connect("t2", "a")],
        );
        assert!(!run(&graph).has_code("unreachable-node"));
    }

    #[test]
    fn each_distinct_cycle_is_reported_once_in_order() {
        // t → a → b → a  and  c ⟲
        let graph = GraphModel::new(
            vec![
                node("t", NodeKind::Trigger),
                node("a", NodeKind::Action),
                node("b", NodeKind::Action),
                node("c", NodeKind::Logic),
            ],
            vec![
                Edge::connect("t", "a"),
                Edge::connect("a", "b"),
                Edge::connect("b", "a"),
                Edge::new("dup", "b", "a"),
                Edge::connect("c", "c"),
            ],
        );

        let report = run(&graph);
        let cycles: Vec<&str> = report
            .errors
            .iter()
            .filter(|e| e.code == "cycle")
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(cycles, vec!["Cycle detected: a → b → a", "Cycle detected: c → c"]);
    }

    #[test]
    fn duplicate_ids_are_critical() {
        let graph = GraphModel::new(
            vec![node("t", NodeKind::Trigger), node("t", NodeKind::Action)],
            vec![Edge::connect("t", "t")],
        );
        let report = run(&graph);
        assert!(report
            .errors
            .iter()
            .any(|e| e.code == "duplicate-node-id" && e.severity == Severity::Critical));
    }

    #[test]
    fn missing_action_is_only_a_warning() {
        let graph = GraphModel::new(vec![node("t", NodeKind::Trigger)], vec![]);
        let report = run(&graph);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.code == "no-action"));
    }
}

//! Scheduling: turn a graph into an execution order.
//!
//! Three views of the same graph:
//! 1. [`topological_order`] — Kahn's algorithm seeded with every
//!    in-degree-zero node, in node array order.
//! 2. [`layered_levels`] — the same walk grouped into levels; this is the
//!    persisted `dag_structure`.
//! 3. [`execution_order`] — Kahn's algorithm seeded with trigger nodes only.
//!    This is the order the executor walks.
//!
//! None of these fail on cyclic input. Nodes on (or downstream of) a cycle
//! simply never reach in-degree zero, so the order comes back short.
//! Surfacing the cycle is the validator's job.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::models::{GraphModel, NodeKind};

/// Index-based adjacency over a graph snapshot.
///
/// Edges with an endpoint that does not resolve to a node are ignored. A
/// repeated node id keeps its first occurrence only, so every id appears
/// at most once in any order built from here.
struct Adjacency<'a> {
    ids: Vec<&'a str>,
    kinds: Vec<NodeKind>,
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl<'a> Adjacency<'a> {
    fn build(graph: &'a GraphModel) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(graph.nodes.len());
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut kinds = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if !index.contains_key(node.id.as_str()) {
                index.insert(node.id.as_str(), ids.len());
                ids.push(node.id.as_str());
                kinds.push(node.kind);
            }
        }

        let mut successors = vec![Vec::new(); ids.len()];
        let mut in_degree = vec![0usize; ids.len()];
        for edge in &graph.edges {
            let source = index.get(edge.source.as_str());
            let target = index.get(edge.target.as_str());
            if let (Some(&s), Some(&t)) = (source, target) {
                successors[s].push(t);
                in_degree[t] += 1;
            }
        }

        Self {
            ids,
            kinds,
            successors,
            in_degree,
        }
    }

    /// Kahn's algorithm from the given seeds; consumes the in-degree table.
    fn kahn(mut self, seeds: impl IntoIterator<Item = usize>) -> Vec<String> {
        let mut queue: VecDeque<usize> = seeds.into_iter().collect();
        let mut sorted = Vec::with_capacity(self.ids.len());

        while let Some(node) = queue.pop_front() {
            sorted.push(self.ids[node].to_owned());
            for &next in &self.successors[node] {
                self.in_degree[next] -= 1;
                if self.in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        sorted
    }

    fn roots(&self) -> Vec<usize> {
        (0..self.ids.len()).filter(|&i| self.in_degree[i] == 0).collect()
    }
}

/// Topological order of every node reachable from an in-degree-zero root.
///
/// For an acyclic graph this is a permutation of all node ids in which every
/// edge points forward. On cyclic input the result is shorter than the node
/// list.
pub fn topological_order(graph: &GraphModel) -> Vec<String> {
    let adjacency = Adjacency::build(graph);
    let roots = adjacency.roots();
    adjacency.kahn(roots)
}

/// The order the executor walks: Kahn's algorithm seeded **only** with
/// trigger nodes that have no incoming edge.
///
/// A non-trigger node without predecessors is never a root here, and neither
/// is anything that only it feeds.
pub fn execution_order(graph: &GraphModel) -> Vec<String> {
    let adjacency = Adjacency::build(graph);
    let seeds: Vec<usize> = (0..adjacency.ids.len())
        .filter(|&i| adjacency.kinds[i] == NodeKind::Trigger && adjacency.in_degree[i] == 0)
        .collect();
    adjacency.kahn(seeds)
}

/// Level decomposition of the graph.
///
/// Level 0 is every in-degree-zero node; level `k + 1` is every node whose
/// last predecessor sits in level `k`. Nodes never released (cycles and
/// whatever hangs off them) are collected into one final catch-all level, so
/// each node id appears in exactly one level.
pub fn layered_levels(graph: &GraphModel) -> Vec<Vec<String>> {
    let mut adjacency = Adjacency::build(graph);
    let mut placed = vec![false; adjacency.ids.len()];
    let mut levels: Vec<Vec<String>> = Vec::new();
    let mut current = adjacency.roots();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &node in &current {
            placed[node] = true;
            for i in 0..adjacency.successors[node].len() {
                let succ = adjacency.successors[node][i];
                adjacency.in_degree[succ] -= 1;
                if adjacency.in_degree[succ] == 0 {
                    next.push(succ);
                }
            }
        }
        levels.push(current.iter().map(|&i| adjacency.ids[i].to_owned()).collect());
        current = next;
    }

    let leftover: Vec<String> = (0..adjacency.ids.len())
        .filter(|&i| !placed[i])
        .map(|i| adjacency.ids[i].to_owned())
        .collect();
    if !leftover.is_empty() {
        levels.push(leftover);
    }

    levels
}

/// `true` when every distinct node id makes it into the topological order.
pub fn is_acyclic(graph: &GraphModel) -> bool {
    let adjacency = Adjacency::build(graph);
    let distinct = adjacency.ids.len();
    let roots = adjacency.roots();
    adjacency.kahn(roots).len() == distinct
}

/// The two exportable scheduling artifacts saved alongside a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePlan {
    pub execution_order: Vec<String>,
    pub dag_structure: Vec<Vec<String>>,
}

impl SchedulePlan {
    pub fn for_graph(graph: &GraphModel) -> Self {
        Self {
            execution_order: topological_order(graph),
            dag_structure: layered_levels(graph),
        }
    }
}

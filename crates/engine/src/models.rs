//! Core domain models for the workflow graph.
//!
//! These types are the source of truth for what a workflow looks like
//! in memory. A [`GraphModel`] is handed to the validator and scheduler by
//! reference and never mutated by them; only the editing session changes it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::node_config::NodeConfig;

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// Coarse category of a node. The subtype selects behaviour within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Action,
    Logic,
    Ai,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trigger => write!(f, "trigger"),
            Self::Action => write!(f, "action"),
            Self::Logic => write!(f, "logic"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Canvas coordinates. Carried for round-tripping only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single step in the workflow graph.
///
/// On the wire a node is `{ id, kind, subtype, label, config, position }`;
/// in memory the subtype and config are fused into one [`NodeConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    /// Unique identifier within this graph (referenced by edges).
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub config: NodeConfig,
    pub position: Position,
}

impl Node {
    /// Create a node labelled after its subtype, placed at the origin.
    pub fn new(id: impl Into<String>, kind: NodeKind, config: NodeConfig) -> Self {
        let label = config.subtype().to_owned();
        Self {
            id: id.into(),
            kind,
            label,
            config,
            position: Position::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    /// Subtype string used to resolve validation rules and executors.
    pub fn subtype(&self) -> &str {
        self.config.subtype()
    }

    pub fn is_trigger(&self) -> bool {
        self.kind == NodeKind::Trigger
    }

    pub fn is_action(&self) -> bool {
        self.kind == NodeKind::Action
    }
}

/// Wire shape of a [`Node`].
#[derive(Serialize, Deserialize)]
struct RawNode {
    id: String,
    kind: NodeKind,
    subtype: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    config: serde_json::Value,
    #[serde(default)]
    position: Position,
}

impl TryFrom<RawNode> for Node {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let config = NodeConfig::from_parts(&raw.subtype, raw.config)?;
        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            label: raw.label,
            config,
            position: raw.position,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        Self {
            subtype: node.config.subtype().to_owned(),
            config: node.config.to_value(),
            id: node.id,
            kind: node.kind,
            label: node.label,
            position: node.position,
        }
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed edge from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Edge whose id is derived from its endpoints.
    pub fn connect(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("e-{source}-{target}"),
            source,
            target,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

// ---------------------------------------------------------------------------
// GraphModel
// ---------------------------------------------------------------------------

/// A complete workflow graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Edges leaving `id`, in edge order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Edges entering `id`, in edge order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// Target ids of the edges leaving `id`.
    pub fn successors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.outgoing(id).map(|e| e.target.as_str())
    }

    pub fn incoming_count(&self, id: &str) -> usize {
        self.incoming(id).count()
    }

    /// Copies of every edge touching `id`.
    pub fn incident_edges(&self, id: &str) -> Vec<Edge> {
        self.edges.iter().filter(|e| e.touches(id)).cloned().collect()
    }

    /// Insert `node` together with `edges`.
    ///
    /// Edges whose id already exists, or whose endpoints are missing once
    /// the node is in place, are skipped. Returns `false` (and changes
    /// nothing) if a node with the same id is already present.
    pub fn insert_node(&mut self, node: Node, edges: Vec<Edge>) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.nodes.push(node);

        let mut known: HashSet<String> = self.edges.iter().map(|e| e.id.clone()).collect();
        for edge in edges {
            if self.contains(&edge.source)
                && self.contains(&edge.target)
                && known.insert(edge.id.clone())
            {
                self.edges.push(edge);
            }
        }
        true
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<(Node, Vec<Edge>)> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            self.edges.drain(..).partition(|e| e.touches(id));
        self.edges = kept;
        Some((node, removed))
    }
}

//! Persisted record shapes.
//!
//! These are *persistence* models; they carry no domain behaviour.
//! Domain types live in the `engine` crate; the graph itself is stored as
//! raw JSON so this crate never depends on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved workflow: the raw graph plus its derived scheduling artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: String,
    /// Full JSON graph definition (nodes + edges).
    pub definition: serde_json::Value,
    /// Topological order of node ids, as computed at save time.
    pub execution_order: Vec<String>,
    /// Layered level decomposition (the "dag_structure").
    pub dag_structure: Vec<Vec<String>>,
    pub saved_at: DateTime<Utc>,
}

//! Authorization requirements for nodes that call third-party services.
//!
//! [`requires_authorization`] is a pure lookup from node to capability;
//! whether the capability is currently held is asked of a
//! [`CapabilityProvider`], which may have to talk to a token store.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Node;
use crate::node_config::NodeConfig;

/// A third-party credential a node needs before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Gmail,
    Trello,
    Asana,
}

impl Capability {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Trello => "trello",
            Self::Asana => "asana",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gmail"  => Ok(Self::Gmail),
            "trello" => Ok(Self::Trello),
            "asana"  => Ok(Self::Asana),
            other    => Err(format!("unknown capability: {other}")),
        }
    }
}

/// The capability `node` needs, if any.
pub fn requires_authorization(node: &Node) -> Option<Capability> {
    match node.config {
        NodeConfig::EmailTrigger(_) => Some(Capability::Gmail),
        NodeConfig::TrelloAction(_) => Some(Capability::Trello),
        NodeConfig::AsanaAction(_) => Some(Capability::Asana),
        _ => None,
    }
}

/// Answers "is this credential currently held?".
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn has_capability(&self, capability: Capability) -> bool;
}

/// A fixed set of granted capabilities.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    granted: HashSet<Capability>,
}

impl StaticCapabilities {
    pub fn new(granted: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    /// Every capability granted.
    pub fn all() -> Self {
        Self::new([Capability::Gmail, Capability::Trello, Capability::Asana])
    }

    pub fn grant(&mut self, capability: Capability) {
        self.granted.insert(capability);
    }

    pub fn revoke(&mut self, capability: Capability) {
        self.granted.remove(&capability);
    }
}

#[async_trait]
impl CapabilityProvider for StaticCapabilities {
    async fn has_capability(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}

//! Placed node record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::property::PropertyMap;

/// Identity of one placement of a node on the canvas.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(NodeId)
    }
}

/// A node as stored in a graph document: which type it is and how it is
/// configured. Behavior and runtime state live in the executor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    /// References a `NodeTypeDefinition` in the `NodeRegistry`.
    /// Examples: "events.on_start", "control.loop", "sprites.move"
    pub type_id: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl GraphNode {
    pub fn new(type_id: &str, properties: PropertyMap) -> Self {
        Self {
            id: NodeId::new(),
            type_id: type_id.to_string(),
            properties,
        }
    }

    pub fn new_with_id(id: NodeId, type_id: &str, properties: PropertyMap) -> Self {
        Self {
            id,
            type_id: type_id.to_string(),
            properties,
        }
    }
}

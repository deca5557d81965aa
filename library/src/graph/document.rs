//! Serializable description of a program graph.

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;
use crate::graph::connection::{Connection, PinId};
use crate::graph::node::{GraphNode, NodeId};
use crate::graph::property::PropertyMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Kept in declaration order: an event fans out to its actions in the
    /// order they appear here.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, type_id: &str, properties: PropertyMap) -> NodeId {
        let node = GraphNode::new(type_id, properties);
        let id = node.id;
        self.nodes.push(node);
        id
    }

    pub fn connect(&mut self, from: NodeId, from_pin: &str, to: NodeId, to_pin: &str) {
        self.connections.push(Connection::new(
            PinId::new(from, from_pin),
            PinId::new(to, to_pin),
        ));
    }

    pub fn get_node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn load(json: &str) -> Result<Self, LibraryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

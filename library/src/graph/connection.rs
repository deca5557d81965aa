//! Pin and connection model for the event/data graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::node::NodeId;

/// Value type declared by a data pin. Informational only: values are
/// coerced by the reading node, never checked at wiring time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    String,
    Boolean,
    Array,
    Sprite,
    /// Accepts any value
    Any,
}

/// What travels through a pin.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    /// Output that fires; carries no payload.
    Event,
    /// Input invoked when a connected event fires.
    Action,
    /// Value pin, read by pulling the most recent upstream output.
    Data(DataType),
}

impl PinKind {
    pub fn is_data(&self) -> bool {
        matches!(self, PinKind::Data(_))
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKind::Event => write!(f, "event"),
            PinKind::Action => write!(f, "action"),
            PinKind::Data(dt) => write!(f, "data({:?})", dt),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// Definition of a pin on a node type.
#[derive(Clone, Debug, PartialEq)]
pub struct PinDefinition {
    /// Internal name used for connections (e.g. "in", "count")
    pub name: String,
    /// Display name shown in the editor
    pub display_name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
}

impl PinDefinition {
    pub fn input(name: &str, display_name: &str, kind: PinKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            direction: PinDirection::Input,
            kind,
        }
    }

    pub fn output(name: &str, display_name: &str, kind: PinKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            direction: PinDirection::Output,
            kind,
        }
    }
}

/// Identifies a specific pin on a specific node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PinId {
    pub node_id: NodeId,
    pub pin_name: String,
}

impl PinId {
    pub fn new(node_id: NodeId, pin_name: &str) -> Self {
        Self {
            node_id,
            pin_name: pin_name.to_string(),
        }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_id, self.pin_name)
    }
}

/// An edge from an output pin to an input pin.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connection {
    /// Source pin (output)
    pub from: PinId,
    /// Destination pin (input)
    pub to: PinId,
}

impl Connection {
    pub fn new(from: PinId, to: PinId) -> Self {
        Self { from, to }
    }
}

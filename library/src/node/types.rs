//! Node type definitions for the event/data graph.

use std::fmt;

use crate::graph::connection::{DataType, PinDefinition, PinKind};
use crate::graph::property::PropertyMap;

/// Category of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Spontaneous event sources (start, update, timer, button, key)
    Events,
    /// Flow control (sequence, branch, loop, wait, gate)
    Control,
    /// Boolean logic and comparison
    Logic,
    /// Arithmetic, constants and random numbers
    Math,
    /// Variable store access
    Variables,
    /// Console and host dialogs
    Io,
    /// String operations
    Text,
    /// Immutable array operations
    Arrays,
    /// Sprite actions and queries
    Sprites,
    /// Comments, watches, beeps, timestamps
    Utils,
    /// Host-defined custom category
    Custom,
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeCategory::Events => "Events",
            NodeCategory::Control => "Control",
            NodeCategory::Logic => "Logic",
            NodeCategory::Math => "Math",
            NodeCategory::Variables => "Variables",
            NodeCategory::Io => "I/O",
            NodeCategory::Text => "Text",
            NodeCategory::Arrays => "Arrays",
            NodeCategory::Sprites => "Sprites",
            NodeCategory::Utils => "Utils",
            NodeCategory::Custom => "Custom",
        };
        write!(f, "{}", s)
    }
}

/// Computes a node's input pins from its properties, for variadic types.
pub type DynamicInputs = fn(&PropertyMap) -> Vec<PinDefinition>;

/// Definition of a node type, registered in the [`NodeRegistry`].
///
/// This describes what a node of this type looks like: its pins, default
/// properties and metadata. Placed instances are `NodeSlot`s in the executor
/// whose `type_id` references a `NodeTypeDefinition`.
///
/// [`NodeRegistry`]: crate::node::registry::NodeRegistry
#[derive(Debug, Clone)]
pub struct NodeTypeDefinition {
    /// Unique type identifier (e.g. "control.loop", "sprites.move")
    pub type_id: String,
    /// Human-readable name (e.g. "Repeat")
    pub display_name: String,
    pub category: NodeCategory,
    /// Description shown in tooltips
    pub description: String,
    pub inputs: Vec<PinDefinition>,
    pub outputs: Vec<PinDefinition>,
    /// Properties every new instance starts with
    pub default_properties: PropertyMap,
    /// Replaces `inputs` per instance when set
    pub dynamic_inputs: Option<DynamicInputs>,
}

impl NodeTypeDefinition {
    pub fn new(type_id: &str, display_name: &str, category: NodeCategory) -> Self {
        Self {
            type_id: type_id.to_string(),
            display_name: display_name.to_string(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            default_properties: PropertyMap::new(),
            dynamic_inputs: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<PinDefinition>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<PinDefinition>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_properties(mut self, props: PropertyMap) -> Self {
        self.default_properties = props;
        self
    }

    pub fn with_dynamic_inputs(mut self, f: DynamicInputs) -> Self {
        self.dynamic_inputs = Some(f);
        self
    }

    /// Input pins for an instance with the given properties.
    pub fn inputs_for(&self, properties: &PropertyMap) -> Vec<PinDefinition> {
        match self.dynamic_inputs {
            Some(f) => f(properties),
            None => self.inputs.clone(),
        }
    }
}

// Pin shorthands used by the catalog.

/// The action input every reactive node exposes.
pub fn action() -> PinDefinition {
    PinDefinition::input("in", "", PinKind::Action)
}

pub fn event(name: &str) -> PinDefinition {
    PinDefinition::output(name, name, PinKind::Event)
}

pub fn inp(name: &str, display: &str, dt: DataType) -> PinDefinition {
    PinDefinition::input(name, display, PinKind::Data(dt))
}

pub fn out(name: &str, display: &str, dt: DataType) -> PinDefinition {
    PinDefinition::output(name, display, PinKind::Data(dt))
}

pub fn node(type_id: &str, name: &str, cat: NodeCategory) -> NodeTypeDefinition {
    NodeTypeDefinition::new(type_id, name, cat)
}

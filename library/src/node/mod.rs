pub mod behavior;
pub mod catalog;
pub mod context;
pub mod registry;
pub mod types;

pub use behavior::{Capabilities, InputEvent, NodeBehavior};
pub use context::NodeContext;
pub use registry::{HeadlessHost, HostServices, NodeEnv, NodeFactory, NodeRegistry};
pub use types::{NodeCategory, NodeTypeDefinition};

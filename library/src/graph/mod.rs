pub mod analysis;
pub mod connection;
pub mod document;
pub mod node;
pub mod property;

pub use connection::{Connection, DataType, PinDefinition, PinDirection, PinId, PinKind};
pub use document::GraphDocument;
pub use node::{GraphNode, NodeId};
pub use property::PropertyMap;

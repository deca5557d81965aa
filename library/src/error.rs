use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Graph error: {0}")]
    Graph(String),
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("Node error: {0}")]
    Node(String),
    #[error("Rendering error: {0}")]
    Render(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl LibraryError {
    pub fn graph(msg: impl Into<String>) -> Self {
        LibraryError::Graph(msg.into())
    }

    pub fn node(msg: impl Into<String>) -> Self {
        LibraryError::Node(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        LibraryError::Render(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        LibraryError::Runtime(msg.into())
    }
}

impl From<Box<dyn std::error::Error>> for LibraryError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        LibraryError::Runtime(err.to_string())
    }
}

pub mod cli;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod graph;
pub mod logging;
pub mod node;
pub mod render;
pub mod runtime;
pub mod session;
pub mod sprite;
pub mod value;
pub mod vars;

pub use cli::run;
pub use error::LibraryError;
pub use session::{ProgramDocument, Session};
pub use value::Value;

//! Built-in node types.

mod arrays;
mod control;
mod events;
mod io;
mod logic;
mod math;
mod sprites;
mod text;
mod utils;
mod variables;

use crate::node::registry::NodeRegistry;

/// Register all built-in node types.
pub fn register_all(registry: &mut NodeRegistry) {
    events::register(registry);
    control::register(registry);
    logic::register(registry);
    math::register(registry);
    variables::register(registry);
    io::register(registry);
    text::register(registry);
    arrays::register(registry);
    sprites::register(registry);
    utils::register(registry);
}

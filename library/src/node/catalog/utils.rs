use std::rc::Rc;

use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::{HostServices, NodeRegistry};
use crate::node::types::{action, event, inp, node, out, NodeCategory};

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Utils;

    registry.register(
        node("utils.comment", "Comment", nc)
            .with_properties(PropertyMap::new().with("text", "Comment")),
        |_| Box::new(Comment),
    );
    registry.register(
        node("utils.watch", "Watch", nc)
            .with_description("Shows the value flowing into it")
            .with_inputs(vec![inp("value", "Value", Any)]),
        |_| Box::new(Watch::default()),
    );
    registry.register(
        node("utils.beep", "Beep", nc)
            .with_inputs(vec![action()])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("freq", 440.0).with("duration", 200.0)),
        |env| Box::new(Beep { host: env.host.clone() }),
    );
    registry.register(
        node("utils.timestamp", "Timestamp", nc)
            .with_outputs(vec![out("ms", "ms", Number)]),
        |_| Box::new(Timestamp),
    );
}

struct Comment;

impl NodeBehavior for Comment {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }
}

struct Watch {
    display: String,
}

impl Default for Watch {
    fn default() -> Self {
        Self {
            display: "null".to_string(),
        }
    }
}

impl NodeBehavior for Watch {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.display = ctx.input("value").to_text();
        Ok(())
    }

    fn display(&self) -> Option<String> {
        Some(self.display.clone())
    }
}

struct Beep {
    host: Rc<dyn HostServices>,
}

impl NodeBehavior for Beep {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let freq = ctx.property_number("freq", 440.0);
        let duration = ctx.property_number("duration", 200.0);
        self.host.beep(freq, duration);
        ctx.fire("out");
        Ok(())
    }
}

struct Timestamp;

impl NodeBehavior for Timestamp {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let now = ctx.now();
        ctx.set_output("ms", now);
        Ok(())
    }
}

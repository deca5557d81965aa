//! Console output and host dialogs.

use std::rc::Rc;

use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::logging::Severity;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::{HostServices, NodeRegistry};
use crate::node::types::{action, event, inp, node, out, NodeCategory};
use crate::value::Value;

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Io;

    registry.register(
        node("io.print", "Print", nc)
            .with_inputs(vec![action(), inp("message", "Message", Any)])
            .with_outputs(vec![event("out")]),
        |_| Box::new(Print),
    );
    registry.register(
        node("io.log", "Log", nc)
            .with_description("Writes to the console with a severity")
            .with_inputs(vec![action(), inp("message", "Message", Any)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("severity", "info")),
        |_| Box::new(Log),
    );
    registry.register(
        node("io.alert", "Alert", nc)
            .with_inputs(vec![action(), inp("message", "Message", String)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("message", "Hello!")),
        |env| Box::new(Alert { host: env.host.clone() }),
    );
    registry.register(
        node("io.prompt", "Ask", nc)
            .with_inputs(vec![action()])
            .with_outputs(vec![event("out"), out("answer", "Answer", String)])
            .with_properties(PropertyMap::new().with("question", "Enter:")),
        |env| Box::new(Prompt { host: env.host.clone() }),
    );
}

struct Print;

impl NodeBehavior for Print {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        // undefined and null are spelled out; arrays and objects print as JSON
        let message = ctx.input("message").to_text();
        ctx.log(&message, Severity::Log);
        ctx.fire("out");
        Ok(())
    }
}

struct Log;

impl NodeBehavior for Log {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let message = match ctx.input("message") {
            v if v.is_nullish() => String::new(),
            v => v.to_text(),
        };
        let severity = ctx
            .property_string("severity", "info")
            .parse::<Severity>()
            .unwrap_or(Severity::Info);
        ctx.log(&message, severity);
        ctx.fire("out");
        Ok(())
    }
}

struct Alert {
    host: Rc<dyn HostServices>,
}

impl NodeBehavior for Alert {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let fallback = ctx.property("message");
        let message = ctx.input_or("message", fallback);
        self.host.alert(&message.to_display_string());
        ctx.fire("out");
        Ok(())
    }
}

struct Prompt {
    host: Rc<dyn HostServices>,
}

impl NodeBehavior for Prompt {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let question = ctx.property_string("question", "Enter:");
        let answer = match self.host.prompt(&question) {
            Some(text) => Value::String(text),
            None => Value::Null,
        };
        ctx.set_output("answer", answer);
        ctx.fire("out");
        Ok(())
    }
}

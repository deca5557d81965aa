use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{inp, node, out, NodeCategory};
use crate::value::{parse_float_prefix, Value};

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Text;

    registry.register(
        node("text.string", "Text", nc)
            .with_outputs(vec![out("out", "Out", String)])
            .with_properties(PropertyMap::new().with("value", "Hello")),
        |_| Box::new(TextConst),
    );
    registry.register(
        node("text.join", "Join", nc)
            .with_inputs(vec![inp("a", "A", String), inp("b", "B", String)])
            .with_outputs(vec![out("out", "Out", String)])
            .with_properties(PropertyMap::new().with("separator", "")),
        |_| Box::new(Join),
    );
    registry.register(
        node("text.length", "Length", nc)
            .with_inputs(vec![inp("text", "Text", String)])
            .with_outputs(vec![out("length", "Length", Number)]),
        |_| Box::new(Length),
    );
    registry.register(
        node("text.to_number", "To Number", nc)
            .with_description("Parses a leading number; anything else is 0")
            .with_inputs(vec![inp("text", "Text", String)])
            .with_outputs(vec![out("number", "Number", Number)]),
        |_| Box::new(ToNumber),
    );
    registry.register(
        node("text.to_text", "To Text", nc)
            .with_inputs(vec![inp("value", "Value", Any)])
            .with_outputs(vec![out("text", "Text", String)]),
        |_| Box::new(ToText),
    );
}

/// Text of a value, with `undefined`/`null` read as empty.
fn text_or_empty(v: &Value) -> String {
    if v.is_nullish() { String::new() } else { v.to_display_string() }
}

struct TextConst;

impl NodeBehavior for TextConst {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let value = ctx.property_string("value", "Hello");
        ctx.set_output("out", value);
        Ok(())
    }
}

struct Join;

impl NodeBehavior for Join {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let a = text_or_empty(&ctx.input("a"));
        let b = text_or_empty(&ctx.input("b"));
        let sep = ctx.property_string("separator", "");
        ctx.set_output("out", format!("{}{}{}", a, sep, b));
        Ok(())
    }
}

struct Length;

impl NodeBehavior for Length {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let text = text_or_empty(&ctx.input("text"));
        ctx.set_output("length", text.chars().count());
        Ok(())
    }
}

struct ToNumber;

impl NodeBehavior for ToNumber {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let n = parse_float_prefix(&ctx.input("text").to_display_string());
        ctx.set_output("number", if n.is_nan() { 0.0 } else { n });
        Ok(())
    }
}

struct ToText;

impl NodeBehavior for ToText {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let text = match ctx.input("value") {
            Value::Undefined => String::new(),
            Value::Null => "null".to_string(),
            other => other.to_text(),
        };
        ctx.set_output("text", text);
        Ok(())
    }
}

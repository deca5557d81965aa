//! Array nodes. Arrays are immutable: every change produces a new one.

use std::rc::Rc;

use crate::error::LibraryError;
use crate::graph::connection::{DataType, PinDefinition};
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{action, event, inp, node, out, NodeCategory};
use crate::value::Value;

/// Upper bound on the inputs of a combine node.
pub const MAX_COMBINE_INPUTS: usize = 64;

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Arrays;

    registry.register(
        node("arrays.create", "Create Array", nc)
            .with_outputs(vec![out("array", "Array", Array)]),
        |_| Box::new(CreateArray::default()),
    );
    registry.register(
        node("arrays.combine", "Combine Array", nc)
            .with_description("Collects its inputs into an array")
            .with_outputs(vec![out("array", "Array", Array)])
            .with_properties(PropertyMap::new().with("input_count", 2.0))
            .with_dynamic_inputs(combine_inputs),
        |_| Box::new(Combine),
    );
    registry.register(
        node("arrays.push", "Push", nc)
            .with_inputs(vec![action(), inp("array", "Array", Array), inp("item", "Item", Any)])
            .with_outputs(vec![event("out"), out("array", "Array", Array)]),
        |_| Box::new(Push),
    );
    registry.register(
        node("arrays.get", "Get Item", nc)
            .with_inputs(vec![inp("array", "Array", Array), inp("index", "Index", Number)])
            .with_outputs(vec![out("item", "Item", Any)])
            .with_properties(PropertyMap::new().with("index", 0.0)),
        |_| Box::new(GetItem),
    );
    registry.register(
        node("arrays.length", "Array Length", nc)
            .with_inputs(vec![inp("array", "Array", Array)])
            .with_outputs(vec![out("length", "Length", Number)]),
        |_| Box::new(Length),
    );
    registry.register(
        node("arrays.for_each", "For Each", nc)
            .with_inputs(vec![action(), inp("array", "Array", Array)])
            .with_outputs(vec![
                event("each"),
                event("done"),
                out("item", "Item", Any),
                out("index", "Index", Number),
            ]),
        |_| Box::new(ForEach),
    );
}

/// Inputs `0..input_count` of a combine node.
fn combine_inputs(properties: &PropertyMap) -> Vec<PinDefinition> {
    let count = (properties.get_number("input_count", 2.0).max(0.0) as usize).min(MAX_COMBINE_INPUTS);
    (0..count)
        .map(|i| {
            let name = i.to_string();
            inp(&name, &name, DataType::Any)
        })
        .collect()
}

/// Items of an array value; anything else reads as empty.
fn items(value: &Value) -> Rc<Vec<Value>> {
    value.as_array().cloned().unwrap_or_default()
}

/// Resolves a possibly negative index against `len`.
pub(crate) fn resolve_index(index: f64, len: usize) -> Option<usize> {
    let mut i = index.floor();
    if i < 0.0 {
        i += len as f64;
    }
    if i >= 0.0 && i < len as f64 { Some(i as usize) } else { None }
}

#[derive(Default)]
struct CreateArray {
    array: Rc<Vec<Value>>,
}

impl NodeBehavior for CreateArray {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::RESET
    }

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.array = Rc::new(Vec::new());
        Ok(())
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        ctx.set_output("array", Value::Array(self.array.clone()));
        Ok(())
    }
}

struct Combine;

impl NodeBehavior for Combine {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let pins = ctx.data_inputs();
        let values = pins.iter().map(|pin| ctx.input_or(pin, Value::Null)).collect::<Vec<_>>();
        ctx.set_output("array", values);
        Ok(())
    }
}

struct Push;

impl NodeBehavior for Push {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let mut array = items(&ctx.input("array")).as_ref().clone();
        array.push(ctx.input("item"));
        ctx.set_output("array", array);
        ctx.fire("out");
        Ok(())
    }
}

struct GetItem;

impl NodeBehavior for GetItem {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let array = items(&ctx.input("array"));
        let index = ctx.input_number_or_property("index", "index", 0.0);
        let item = resolve_index(index, array.len())
            .map(|i| array[i].clone())
            .unwrap_or_default();
        ctx.set_output("item", item);
        Ok(())
    }
}

struct Length;

impl NodeBehavior for Length {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let len = ctx.input("array").as_array().map_or(0, |a| a.len());
        ctx.set_output("length", len);
        Ok(())
    }
}

struct ForEach;

impl NodeBehavior for ForEach {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let array = items(&ctx.input("array"));
        for (i, item) in array.iter().enumerate() {
            ctx.set_output("item", item.clone());
            ctx.set_output("index", i);
            ctx.fire("each");
        }
        ctx.fire("done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        assert_eq!(resolve_index(-1.0, 3), Some(2));
        assert_eq!(resolve_index(1.7, 3), Some(1));
        assert_eq!(resolve_index(3.0, 3), None);
        assert_eq!(resolve_index(-4.0, 3), None);
        assert_eq!(resolve_index(0.0, 0), None);
    }

    #[test]
    fn combine_pins_follow_input_count() {
        let pins = combine_inputs(&PropertyMap::new().with("input_count", 3.0));
        let names: Vec<_> = pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["0", "1", "2"]);
    }

    #[test]
    fn combine_input_count_is_bounded() {
        let huge = combine_inputs(&PropertyMap::new().with("input_count", 1e9));
        assert_eq!(huge.len(), MAX_COMBINE_INPUTS);
        assert!(combine_inputs(&PropertyMap::new().with("input_count", -3.0)).is_empty());
    }
}

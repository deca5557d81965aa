use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{action, event, inp, node, out, NodeCategory};
use crate::value::parse_float_prefix;
use crate::vars::VariableStore;

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Variables;

    registry.register(
        node("variables.get", "Get Variable", nc)
            .with_outputs(vec![out("value", "Value", Any)])
            .with_properties(PropertyMap::new().with("name", "myVar")),
        |env| Box::new(GetVar { vars: env.vars.clone() }),
    );
    registry.register(
        node("variables.set", "Set Variable", nc)
            .with_inputs(vec![action(), inp("value", "Value", Any)])
            .with_outputs(vec![event("out"), out("value", "Value", Any)])
            .with_properties(PropertyMap::new().with("name", "myVar")),
        |env| Box::new(SetVar { vars: env.vars.clone() }),
    );
    registry.register(
        node("variables.change", "Change Variable", nc)
            .with_description("Adds an amount to a numeric variable")
            .with_inputs(vec![action(), inp("amount", "Amount", Number)])
            .with_outputs(vec![event("out"), out("value", "New", Number)])
            .with_properties(PropertyMap::new().with("name", "myVar").with("amount", 1.0)),
        |env| Box::new(ChangeVar { vars: env.vars.clone() }),
    );
}

struct GetVar {
    vars: VariableStore,
}

impl NodeBehavior for GetVar {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let name = ctx.property_string("name", "myVar");
        ctx.set_output("value", self.vars.get(&name));
        Ok(())
    }
}

struct SetVar {
    vars: VariableStore,
}

impl NodeBehavior for SetVar {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let name = ctx.property_string("name", "myVar");
        let value = ctx.input("value");
        self.vars.set(&name, value.clone());
        ctx.set_output("value", value);
        ctx.fire("out");
        Ok(())
    }
}

struct ChangeVar {
    vars: VariableStore,
}

impl NodeBehavior for ChangeVar {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let name = ctx.property_string("name", "myVar");
        let current = parse_float_prefix(&self.vars.get(&name).to_display_string());
        let current = if current.is_nan() { 0.0 } else { current };
        let amount = ctx.input_number_or_property("amount", "amount", 1.0);
        let updated = current + amount;
        self.vars.set(&name, updated.into());
        ctx.set_output("value", updated);
        ctx.fire("out");
        Ok(())
    }
}

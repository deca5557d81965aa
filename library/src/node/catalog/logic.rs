use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{inp, node, out, NodeCategory};
use crate::value::Value;

type BoolOp = fn(bool, bool) -> bool;

const GATES: [(&str, &str, BoolOp); 4] = [
    ("logic.and", "AND", |a, b| a && b),
    ("logic.or", "OR", |a, b| a || b),
    ("logic.xor", "XOR", |a, b| a != b),
    ("logic.nand", "NAND", |a, b| !(a && b)),
];

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Logic;

    for (type_id, title, op) in GATES {
        registry.register(
            node(type_id, title, nc)
                .with_inputs(vec![inp("a", "A", Boolean), inp("b", "B", Boolean)])
                .with_outputs(vec![out("out", "Out", Boolean)]),
            move |_| Box::new(Gate { op }),
        );
    }
    registry.register(
        node("logic.not", "NOT", nc)
            .with_inputs(vec![inp("value", "In", Boolean)])
            .with_outputs(vec![out("out", "Out", Boolean)]),
        |_| Box::new(Not),
    );
    registry.register(
        node("logic.compare", "Compare", nc)
            .with_description("Compares A and B with ==, !=, <, >, <= or >=")
            .with_inputs(vec![inp("a", "A", Any), inp("b", "B", Any)])
            .with_outputs(vec![out("out", "Out", Boolean)])
            .with_properties(PropertyMap::new().with("op", "==")),
        |_| Box::new(Compare),
    );
    registry.register(
        node("logic.boolean", "Boolean", nc)
            .with_outputs(vec![out("out", "Out", Boolean)])
            .with_properties(PropertyMap::new().with("value", true)),
        |_| Box::new(BooleanConst),
    );
}

struct Gate {
    op: BoolOp,
}

impl NodeBehavior for Gate {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let a = ctx.input("a").truthy();
        let b = ctx.input("b").truthy();
        ctx.set_output("out", (self.op)(a, b));
        Ok(())
    }
}

struct Not;

impl NodeBehavior for Not {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let v = ctx.input("value").truthy();
        ctx.set_output("out", !v);
        Ok(())
    }
}

/// Applies a relational operator. Unknown operators and incomparable
/// operands yield `false`.
pub(crate) fn compare(op: &str, a: &Value, b: &Value) -> bool {
    use std::cmp::Ordering::*;
    match op {
        "==" => a.loose_eq(b),
        "!=" => !a.loose_eq(b),
        "<" => a.loose_cmp(b) == Some(Less),
        ">" => a.loose_cmp(b) == Some(Greater),
        "<=" => matches!(a.loose_cmp(b), Some(Less | Equal)),
        ">=" => matches!(a.loose_cmp(b), Some(Greater | Equal)),
        _ => false,
    }
}

struct Compare;

impl NodeBehavior for Compare {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let a = ctx.input_or("a", 0.0);
        let b = ctx.input_or("b", 0.0);
        let op = ctx.property_string("op", "==");
        ctx.set_output("out", compare(&op, &a, &b));
        Ok(())
    }
}

struct BooleanConst;

impl NodeBehavior for BooleanConst {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let value = ctx.property_bool("value", true);
        ctx.set_output("out", value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_comparisons() {
        assert!(compare("==", &Value::from(1.0), &Value::from("1")));
        assert!(compare("!=", &Value::from(1.0), &Value::from(2.0)));
        assert!(compare("<", &Value::from(1.0), &Value::from(2.0)));
        assert!(compare(">=", &Value::from("b"), &Value::from("a")));
        assert!(!compare("<", &Value::from("x"), &Value::from(1.0)));
        assert!(!compare("<>", &Value::from(1.0), &Value::from(1.0)));
    }
}

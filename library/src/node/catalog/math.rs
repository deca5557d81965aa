//! Arithmetic nodes. Every result that would not be a number resolves to 0.

use rand::Rng;

use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{inp, node, out, NodeCategory};

type BinaryOp = fn(f64, f64) -> f64;
type UnaryOp = fn(f64) -> f64;

fn divide(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a / b }
}

fn modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a % b }
}

/// Rounds half up, toward positive infinity.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

const BINARY: [(&str, &str, BinaryOp); 8] = [
    ("math.add", "Add", |a, b| a + b),
    ("math.subtract", "Subtract", |a, b| a - b),
    ("math.multiply", "Multiply", |a, b| a * b),
    ("math.divide", "Divide", divide),
    ("math.modulo", "Mod", modulo),
    ("math.power", "Power", f64::powf),
    ("math.min", "Min", f64::min),
    ("math.max", "Max", f64::max),
];

const UNARY: [(&str, &str, UnaryOp); 8] = [
    ("math.abs", "Abs", f64::abs),
    ("math.floor", "Floor", f64::floor),
    ("math.ceil", "Ceil", f64::ceil),
    ("math.round", "Round", round_half_up),
    ("math.sqrt", "Sqrt", f64::sqrt),
    ("math.sin", "Sin", f64::sin),
    ("math.cos", "Cos", f64::cos),
    ("math.negate", "Negate", |x| -x),
];

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Math;

    registry.register(
        node("math.number", "Number", nc)
            .with_outputs(vec![out("out", "Out", Number)])
            .with_properties(PropertyMap::new().with("value", 0.0)),
        |_| Box::new(NumberConst),
    );
    for (type_id, title, op) in BINARY {
        registry.register(
            node(type_id, title, nc)
                .with_inputs(vec![inp("a", "A", Number), inp("b", "B", Number)])
                .with_outputs(vec![out("out", "Out", Number)]),
            move |_| Box::new(Binary { op }),
        );
    }
    for (type_id, title, op) in UNARY {
        registry.register(
            node(type_id, title, nc)
                .with_inputs(vec![inp("value", "In", Number)])
                .with_outputs(vec![out("out", "Out", Number)]),
            move |_| Box::new(Unary { op }),
        );
    }
    registry.register(
        node("math.random", "Random", nc)
            .with_description("Uniform random number in [min, max)")
            .with_inputs(vec![inp("min", "Min", Number), inp("max", "Max", Number)])
            .with_outputs(vec![out("out", "Out", Number)])
            .with_properties(
                PropertyMap::new()
                    .with("min", 0.0)
                    .with("max", 100.0)
                    .with("integer", false),
            ),
        |_| Box::new(Random),
    );
}

fn nan_to_zero(n: f64) -> f64 {
    if n.is_nan() { 0.0 } else { n }
}

struct NumberConst;

impl NodeBehavior for NumberConst {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let value = ctx.property_number("value", 0.0);
        ctx.set_output("out", value);
        Ok(())
    }
}

struct Binary {
    op: BinaryOp,
}

impl NodeBehavior for Binary {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let a = ctx.input_number("a", 0.0);
        let b = ctx.input_number("b", 0.0);
        ctx.set_output("out", nan_to_zero((self.op)(a, b)));
        Ok(())
    }
}

struct Unary {
    op: UnaryOp,
}

impl NodeBehavior for Unary {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let x = ctx.input_number("value", 0.0);
        ctx.set_output("out", nan_to_zero((self.op)(x)));
        Ok(())
    }
}

struct Random;

impl NodeBehavior for Random {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::VOLATILE
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let min = ctx.input_number_or_property("min", "min", 0.0);
        let max = ctx.input_number_or_property("max", "max", 100.0);
        let value = min + rand::thread_rng().r#gen::<f64>() * (max - min);
        let value = if ctx.property_bool("integer", false) { value.floor() } else { value };
        ctx.set_output("out", value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(divide(5.0, 0.0), 0.0);
        assert_eq!(modulo(5.0, 0.0), 0.0);
        assert_eq!(divide(-5.0, 0.0), 0.0);
        assert_eq!(divide(9.0, 3.0), 3.0);
        assert_eq!(modulo(-7.0, 3.0), -1.0);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(1.2), 1.0);
    }

    #[test]
    fn nan_results_become_zero() {
        assert_eq!(nan_to_zero(f64::sqrt(-1.0)), 0.0);
        assert_eq!(nan_to_zero(f64::INFINITY), f64::INFINITY);
    }
}

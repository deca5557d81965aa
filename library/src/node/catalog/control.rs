//! Flow control: sequence, branch, bounded repeat, wait and gate.

use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{action, event, inp, node, out, NodeCategory};

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Control;

    registry.register(
        node("control.sequence", "Sequence", nc)
            .with_description("Fires each output in order")
            .with_inputs(vec![action()])
            .with_outputs(vec![event("1"), event("2"), event("3")]),
        |_| Box::new(Sequence),
    );
    registry.register(
        node("control.branch", "Branch", nc)
            .with_inputs(vec![action(), inp("cond", "Condition", Boolean)])
            .with_outputs(vec![event("true"), event("false")]),
        |_| Box::new(Branch),
    );
    registry.register(
        node("control.loop", "Repeat", nc)
            .with_description("Fires the body N times, then done")
            .with_inputs(vec![action(), inp("count", "Count", Number)])
            .with_outputs(vec![event("loop"), out("index", "Index", Number), event("done")])
            .with_properties(PropertyMap::new().with("count", 10.0)),
        |_| Box::new(Loop),
    );
    registry.register(
        node("control.wait", "Wait", nc)
            .with_description("Fires after a delay")
            .with_inputs(vec![action(), inp("ms", "ms", Number)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("delay", 1000.0)),
        |_| Box::new(Wait),
    );
    registry.register(
        node("control.gate", "Gate", nc)
            .with_inputs(vec![action(), inp("open", "Open", Boolean)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("open", true)),
        |_| Box::new(Gate),
    );
}

struct Sequence;

impl NodeBehavior for Sequence {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        for pin in ["1", "2", "3"] {
            ctx.fire(pin);
        }
        Ok(())
    }
}

struct Branch;

impl NodeBehavior for Branch {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        if ctx.input("cond").truthy() {
            ctx.fire("true");
        } else {
            ctx.fire("false");
        }
        Ok(())
    }
}

/// Upper bound on the iterations of a single loop activation.
pub const MAX_LOOP_ITERATIONS: usize = 100_000;

/// Number of iterations for a repeat count; fractional counts round up,
/// negative and non-numeric counts run zero times.
pub(crate) fn iterations(count: f64) -> usize {
    if count > 0.0 {
        (count.ceil() as usize).min(MAX_LOOP_ITERATIONS)
    } else {
        0
    }
}

struct Loop;

impl NodeBehavior for Loop {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let count = ctx.input_number_or_property("count", "count", 10.0);
        for i in 0..iterations(count) {
            ctx.set_output("index", i as f64);
            ctx.fire("loop");
        }
        ctx.fire("done");
        Ok(())
    }
}

struct Wait;

impl NodeBehavior for Wait {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let delay = ctx.input_number_or_property("ms", "delay", 1000.0).max(0.0);
        ctx.schedule_fire(delay, "out");
        Ok(())
    }
}

struct Gate;

impl NodeBehavior for Gate {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let open = match ctx.input("open") {
            v if v.is_nullish() => ctx.property_bool("open", true),
            v => v.truthy(),
        };
        if open {
            ctx.fire("out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{iterations, MAX_LOOP_ITERATIONS};

    #[test]
    fn repeat_counts() {
        assert_eq!(iterations(3.0), 3);
        assert_eq!(iterations(0.0), 0);
        assert_eq!(iterations(-2.0), 0);
        assert_eq!(iterations(2.5), 3);
        assert_eq!(iterations(f64::NAN), 0);
        assert_eq!(iterations(f64::INFINITY), MAX_LOOP_ITERATIONS);
        assert_eq!(iterations(1e12), MAX_LOOP_ITERATIONS);
    }
}

mod common;

use std::rc::Rc;

use common::{harness, harness_with, props, Harness};
use fart_runtime::config::RuntimeConfig;
use fart_runtime::error::LibraryError;
use fart_runtime::graph::PropertyMap;
use fart_runtime::node::types::{action, event, node};
use fart_runtime::node::{Capabilities, InputEvent, NodeBehavior, NodeCategory, NodeContext, NodeRegistry};
use fart_runtime::value::Value;

fn printer(h: &mut Harness, text: &str) -> fart_runtime::graph::NodeId {
    let source = h.add("text.string", props().with("value", text));
    let print = h.add("io.print", props());
    h.wire(source, "out", print, "message");
    print
}

#[test]
fn loop_fires_body_count_times_then_done() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let repeat = h.add("control.loop", props().with("count", 3.0));
    let body = h.add("io.print", props());
    let done = printer(&mut h, "done");
    h.wire(start, "out", repeat, "in");
    h.wire(repeat, "loop", body, "in");
    h.wire(repeat, "index", body, "message");
    h.wire(repeat, "done", done, "in");

    assert!(h.session.run());
    h.tick_after(16.0);
    h.tick_after(16.0);

    assert_eq!(h.printed(), ["0", "1", "2", "done"]);
}

#[test]
fn loop_count_rounds_up_and_ignores_non_positive() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let a = h.add("control.loop", props().with("count", 2.2));
    let b = h.add("control.loop", props().with("count", -4.0));
    let counter = h.add("variables.change", props().with("name", "n"));
    h.wire(start, "out", a, "in");
    h.wire(start, "out", b, "in");
    h.wire(a, "loop", counter, "in");
    h.wire(b, "loop", counter, "in");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.session.vars().get("n"), Value::Number(3.0));
}

#[test]
fn fan_out_follows_connection_order() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let second = printer(&mut h, "second");
    let first = printer(&mut h, "first");
    h.wire(start, "out", first, "in");
    h.wire(start, "out", second, "in");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.printed(), ["first", "second"]);
}

#[test]
fn readers_see_writes_made_earlier_in_the_same_chain() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let seq = h.add("control.sequence", props());
    let change = h.add("variables.change", props().with("name", "score").with("amount", 5.0));
    let get = h.add("variables.get", props().with("name", "score"));
    let print = h.add("io.print", props());
    h.wire(start, "out", seq, "in");
    h.wire(seq, "1", change, "in");
    h.wire(seq, "2", print, "in");
    h.wire(get, "value", print, "message");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.printed(), ["5"]);
}

#[test]
fn division_and_modulo_by_zero_give_zero() {
    let mut h = harness();
    let five = h.add("math.number", props().with("value", 5.0));
    let zero = h.add("math.number", props().with("value", 0.0));
    let div = h.add("math.divide", props());
    let rem = h.add("math.modulo", props());
    for node in [div, rem] {
        h.wire(five, "out", node, "a");
        h.wire(zero, "out", node, "b");
    }
    h.session.step();
    assert_eq!(h.exec().output(div, "out"), Value::Number(0.0));
    assert_eq!(h.exec().output(rem, "out"), Value::Number(0.0));
}

#[test]
fn wait_fires_after_its_delay() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let wait = h.add("control.wait", props().with("delay", 500.0));
    let print = printer(&mut h, "waited");
    h.wire(start, "out", wait, "in");
    h.wire(wait, "out", print, "in");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.exec().pending_timers(), 1);
    h.tick_after(400.0);
    assert!(h.printed().is_empty());
    h.tick_after(200.0);
    assert_eq!(h.printed(), ["waited"]);
}

#[test]
fn stop_then_restart_drops_stale_waits() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let wait = h.add("control.wait", props().with("delay", 1000.0));
    let print = printer(&mut h, "fired");
    h.wire(start, "out", wait, "in");
    h.wire(wait, "out", print, "in");

    h.session.run();
    h.tick_after(16.0);
    assert!(h.session.stop());
    assert_eq!(h.exec().pending_timers(), 0);

    h.clock.advance(300.0);
    h.session.run();
    h.tick_after(16.0);
    // The first run's wait would have been due here.
    h.tick_after(800.0);
    assert!(h.printed().is_empty());
    h.tick_after(300.0);
    assert_eq!(h.printed(), ["fired"]);
}

#[test]
fn depth_guard_aborts_runaway_chains() {
    let mut config = RuntimeConfig::default();
    config.executor.max_fire_depth = 3;
    let mut h = harness_with(config);
    let start = h.add("events.on_start", props());
    let mut prev = start;
    let mut prev_pin = "out";
    for _ in 0..4 {
        let seq = h.add("control.sequence", props());
        h.wire(prev, prev_pin, seq, "in");
        prev = seq;
        prev_pin = "1";
    }
    let print = printer(&mut h, "too deep");
    h.wire(prev, prev_pin, print, "in");

    h.session.run();
    h.tick_after(16.0);
    assert!(h.printed().is_empty());
    assert!(h.errors().iter().any(|e| e.contains("deeper than 3")));
}

#[test]
fn feedback_cycle_is_refused() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let a = h.add("control.sequence", props());
    let b = h.add("control.sequence", props());
    let print = printer(&mut h, "after cycle");
    h.wire(start, "out", a, "in");
    h.wire(a, "1", b, "in");
    h.wire(b, "1", a, "in");
    h.wire(b, "2", print, "in");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.printed(), ["after cycle"]);
    assert!(h.errors().iter().any(|e| e.contains("Event cycle")));
}

struct Failing;

impl NodeBehavior for Failing {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::PUSH
    }

    fn on_execute(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        Err(LibraryError::node("boom"))
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        ctx.fire("out");
        Err(LibraryError::node("late boom"))
    }
}

#[test]
fn hook_errors_are_logged_and_the_tick_continues() {
    let mut registry = NodeRegistry::with_builtin();
    registry.register(
        node("test.failing", "Failing", NodeCategory::Custom)
            .with_inputs(vec![action()])
            .with_outputs(vec![event("out")]),
        |_| Box::new(Failing),
    );
    let mut h = harness();
    h.session = fart_runtime::Session::with_registry(
        RuntimeConfig::default(),
        Rc::new(registry),
        h.clock.clone(),
        h.log.clone(),
        h.host.clone(),
    );
    let failing = h.add("test.failing", props());
    let start = h.add("events.on_start", props());
    let print = printer(&mut h, "still running");
    h.wire(start, "out", failing, "in");
    h.wire(failing, "out", print, "in");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.printed(), ["still running"]);
    let errors = h.errors();
    assert!(errors.iter().any(|e| e.contains("on_execute") && e.contains("boom")));
    assert!(errors.iter().any(|e| e.contains("on_action") && e.contains("late boom")));
}

#[test]
fn wiring_rules_are_enforced() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let n = h.add("math.number", props());
    let print = h.add("io.print", props());

    // data into an action pin, event into a data pin, input used as output
    assert!(h.exec().connect(n, "out", print, "in").is_err());
    assert!(h.exec().connect(start, "out", print, "message").is_err());
    assert!(h.exec().connect(print, "in", start, "out").is_err());

    h.wire(start, "out", print, "in");
    assert!(h.exec().connect(start, "out", print, "in").is_err());

    let missing = fart_runtime::graph::NodeId::new();
    assert!(matches!(
        h.exec().connect(missing, "out", print, "in"),
        Err(LibraryError::NodeNotFound(_))
    ));
}

#[test]
fn removing_a_node_drops_its_connections_and_timers() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let wait = h.add("control.wait", props().with("delay", 100.0));
    h.wire(start, "out", wait, "in");
    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.exec().pending_timers(), 1);

    h.exec().remove_node(wait).unwrap();
    assert!(h.exec().connections().is_empty());
    assert_eq!(h.exec().pending_timers(), 0);
    assert!(h.exec().remove_node(wait).is_err());
}

#[test]
fn key_presses_reach_subscribers_only_while_running() {
    let mut h = harness();
    let key = h.add("events.on_key", props().with("key", "a"));
    let counter = h.add("variables.change", props().with("name", "presses"));
    h.wire(key, "out", counter, "in");

    h.session.key_down("a", "KeyA");
    h.session.step();
    assert_eq!(h.session.vars().get("presses"), Value::Undefined);

    h.session.run();
    h.session.key_down("A", "KeyA");
    h.session.key_down("b", "KeyB");
    h.tick_after(16.0);
    h.tick_after(16.0);
    assert_eq!(h.session.vars().get("presses"), Value::Number(1.0));
}

#[test]
fn keys_latched_before_stop_are_dropped() {
    let mut h = harness();
    let key = h.add("events.on_key", props().with("key", "a"));
    let counter = h.add("variables.change", props().with("name", "presses"));
    h.wire(key, "out", counter, "in");

    h.session.run();
    h.session.key_down("a", "KeyA");
    h.session.stop();
    h.session.step();
    assert_eq!(h.session.vars().get("presses"), Value::Undefined);

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.session.vars().get("presses"), Value::Undefined);
}

#[test]
fn buttons_fire_when_clicked() {
    let mut h = harness();
    let button = h.add("events.button", props());
    let counter = h.add("variables.change", props().with("name", "clicks"));
    let n = h.add("math.number", props());
    h.wire(button, "out", counter, "in");

    h.exec().click(button).unwrap();
    h.exec().click(button).unwrap();
    assert_eq!(h.session.vars().get("clicks"), Value::Number(2.0));
    assert!(h.exec().click(n).is_err());
}

#[test]
fn input_events_are_plain_data() {
    assert_eq!(
        InputEvent::key("a", "KeyA"),
        InputEvent::KeyDown {
            key: "a".into(),
            code: "KeyA".into()
        }
    );
}

#[test]
fn graph_documents_round_trip_through_the_executor() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let print = printer(&mut h, "hi");
    h.wire(start, "out", print, "in");
    let doc = h.exec().to_graph();
    let json = doc.save().unwrap();

    let mut other = harness();
    other
        .exec()
        .load_graph(&fart_runtime::graph::GraphDocument::load(&json).unwrap())
        .unwrap();
    assert_eq!(other.exec().len(), 3);
    assert_eq!(other.exec().to_graph(), doc);
    other.session.run();
    other.tick_after(16.0);
    assert_eq!(other.printed(), ["hi"]);
}

#[test]
fn loading_a_broken_graph_keeps_the_previous_one() {
    let mut doc = fart_runtime::graph::GraphDocument::new();
    doc.add_node("events.on_start", PropertyMap::new());
    doc.add_node("no.such_node", PropertyMap::new());

    let mut h = harness();
    let err = h.exec().load_graph(&doc).unwrap_err();
    assert!(matches!(err, LibraryError::UnknownNodeType(_)));
    assert!(h.exec().is_empty());

    let start = h.add("events.on_start", props());
    let print = printer(&mut h, "kept");
    h.wire(start, "out", print, "in");
    let before = h.exec().to_graph();
    assert!(h.exec().load_graph(&doc).is_err());
    assert_eq!(h.exec().to_graph(), before);

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.printed(), ["kept"]);
}

#[test]
fn push_returns_a_new_array_and_leaves_its_input_alone() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let one = h.add("math.number", props().with("value", 1.0));
    let two = h.add("math.number", props().with("value", 2.0));
    let three = h.add("math.number", props().with("value", 3.0));
    let combine = h.add("arrays.combine", props());
    let push = h.add("arrays.push", props());
    h.wire(one, "out", combine, "0");
    h.wire(two, "out", combine, "1");
    h.wire(start, "out", push, "in");
    h.wire(combine, "array", push, "array");
    h.wire(three, "out", push, "item");

    h.session.run();
    h.tick_after(16.0);
    let nums = |items: &[f64]| Value::from(items.iter().map(|&n| Value::Number(n)).collect::<Vec<_>>());
    assert_eq!(h.exec().output(push, "array"), nums(&[1.0, 2.0, 3.0]));
    assert_eq!(h.exec().output(combine, "array"), nums(&[1.0, 2.0]));

    h.tick_after(16.0);
    assert_eq!(h.exec().output(combine, "array"), nums(&[1.0, 2.0]));
}

#[test]
fn random_values_hold_for_the_whole_tick() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let seq = h.add("control.sequence", props());
    let random = h.add("math.random", props().with("max", 1_000_000.0));
    let first = h.add("io.print", props());
    let second = h.add("io.print", props());
    h.wire(start, "out", seq, "in");
    h.wire(seq, "1", first, "in");
    h.wire(seq, "2", second, "in");
    h.wire(random, "out", first, "message");
    h.wire(random, "out", second, "message");

    h.session.run();
    h.tick_after(16.0);
    let printed = h.printed();
    assert_eq!(printed.len(), 2);
    assert_eq!(printed[0], printed[1]);
    assert!(printed[0].parse::<f64>().is_ok());
}

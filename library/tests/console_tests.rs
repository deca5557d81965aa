mod common;

use common::{harness, props};
use fart_runtime::console::run_line;
use fart_runtime::logging::Severity;
use fart_runtime::sprite::SpriteOptions;
use fart_runtime::value::Value;

#[test]
fn run_refuses_an_empty_graph() {
    let mut h = harness();
    run_line(&mut h.session, "run");
    assert!(!h.session.is_running());
    assert_eq!(h.log.with_severity(Severity::Warn), ["No nodes to execute!"]);

    run_line(&mut h.session, "step");
    assert_eq!(
        h.log.with_severity(Severity::Warn),
        ["No nodes to execute!", "No nodes to execute"]
    );
}

#[test]
fn run_stop_and_step_report_their_state() {
    let mut h = harness();
    h.add("events.on_start", props());
    run_line(&mut h.session, "run");
    run_line(&mut h.session, "run");
    assert!(h.session.is_running());
    run_line(&mut h.session, "stop");
    run_line(&mut h.session, "stop");
    run_line(&mut h.session, "step");

    assert_eq!(h.log.with_severity(Severity::Success), ["Program started"]);
    assert_eq!(h.log.with_severity(Severity::Warn), ["Program stopped"]);
    assert_eq!(h.log.with_severity(Severity::Info), ["Stepped"]);
}

#[test]
fn variable_commands() {
    let mut h = harness();
    run_line(&mut h.session, "set greeting hello   world");
    run_line(&mut h.session, "set n 42");
    run_line(&mut h.session, "set lonely");
    run_line(&mut h.session, "get n");
    run_line(&mut h.session, "del greeting");
    run_line(&mut h.session, "del greeting");

    assert_eq!(h.session.vars().get("n"), Value::Number(42.0));
    assert!(!h.session.vars().contains("greeting"));
    assert_eq!(
        h.log.with_severity(Severity::Success),
        ["greeting set", "n set", "Deleted: greeting"]
    );
    assert_eq!(h.log.with_severity(Severity::Warn), ["Usage: set <name> <value>"]);
    assert_eq!(h.log.with_severity(Severity::Output), ["n = 42"]);
    assert_eq!(h.log.with_severity(Severity::Input)[0], "> set greeting hello   world");
}

#[test]
fn vars_prints_pretty_json() {
    let mut h = harness();
    h.session.vars().set("a", Value::Number(1.0));
    run_line(&mut h.session, "vars");
    assert_eq!(h.log.with_severity(Severity::Output), ["{\n  \"a\": 1\n}"]);
}

#[test]
fn listing_sprites_and_nodes() {
    let mut h = harness();
    h.session.stage().borrow_mut().add_sprite(
        "Cat",
        SpriteOptions {
            x: 10.4,
            y: -2.5,
            ..SpriteOptions::default()
        },
    );
    h.add("events.on_start", props());
    h.add("io.print", props());

    run_line(&mut h.session, "sprites");
    run_line(&mut h.session, "nodes");

    assert_eq!(
        h.log.with_severity(Severity::Output),
        ["Cat: (10, -2)", "  0: On Start", "  1: Print"]
    );
    assert_eq!(h.log.with_severity(Severity::Info), ["Nodes: 2"]);
}

#[test]
fn unknown_commands_are_errors() {
    let mut h = harness();
    run_line(&mut h.session, "dance");
    run_line(&mut h.session, "   ");
    assert_eq!(
        h.log.with_severity(Severity::Error),
        ["Unknown command: dance. Type 'help' for commands."]
    );
    assert_eq!(h.log.with_severity(Severity::Input).len(), 1);
}

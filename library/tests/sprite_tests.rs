mod common;

use common::{harness, props};
use fart_runtime::sprite::{GlideOutcome, Sprite, SpriteOptions};
use fart_runtime::value::Value;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn move_go_to_move() {
    let mut sprite = Sprite::new("Cat", SpriteOptions::default());
    sprite.point_in_direction(90.0);
    sprite.move_steps(10.0);
    assert!(close(sprite.x, 10.0) && close(sprite.y, 0.0));

    sprite.go_to(-20.0, 5.0);
    sprite.point_in_direction(0.0);
    sprite.move_steps(10.0);
    assert!(close(sprite.x, -20.0) && close(sprite.y, 15.0));
}

#[test]
fn point_towards_faces_the_target() {
    let mut sprite = Sprite::new("Cat", SpriteOptions::default());
    sprite.point_towards(10.0, 0.0);
    assert!(close(sprite.rotation, 90.0));
    sprite.move_steps(5.0);
    assert!(close(sprite.x, 5.0) && close(sprite.y, 0.0));
}

#[test]
fn speech_persists_expires_and_is_replaced() {
    let mut sprite = Sprite::new("Cat", SpriteOptions::default());
    sprite.say("forever", 0.0, 0.0);
    sprite.advance(1_000_000.0);
    assert_eq!(sprite.speech(), Some("forever"));

    sprite.say("brief", 500.0, 0.0);
    sprite.advance(499.0);
    assert_eq!(sprite.speech(), Some("brief"));
    sprite.advance(500.0);
    assert_eq!(sprite.speech(), None);

    // A newer message cancels the older one's clear.
    sprite.say("first", 500.0, 0.0);
    sprite.say("second", 0.0, 100.0);
    sprite.advance(600.0);
    assert_eq!(sprite.speech(), Some("second"));

    sprite.say("", 0.0, 700.0);
    assert_eq!(sprite.speech(), None);
}

#[test]
fn glides_arrive_or_are_interrupted() {
    let mut sprite = Sprite::new("Cat", SpriteOptions::default());
    let mut handle = sprite.glide_to(100.0, 0.0, 1000.0, 0.0);
    sprite.advance(500.0);
    assert!(close(sprite.x, 50.0));
    assert_eq!(handle.outcome(), None);
    sprite.advance(1000.0);
    assert!(close(sprite.x, 100.0));
    assert_eq!(handle.outcome(), Some(GlideOutcome::Arrived));

    let mut handle = sprite.glide_to(0.0, 0.0, 1000.0, 1000.0);
    sprite.go_to(7.0, 7.0);
    assert_eq!(handle.outcome(), Some(GlideOutcome::Interrupted));
    assert!(!sprite.is_gliding());

    let mut instant = sprite.glide_to(1.0, 2.0, 0.0, 2000.0);
    assert_eq!(instant.outcome(), Some(GlideOutcome::Arrived));
    assert!(close(sprite.x, 1.0) && close(sprite.y, 2.0));
}

#[test]
fn sprite_nodes_drive_the_stage() {
    let mut h = harness();
    let cat = h
        .session
        .stage()
        .borrow_mut()
        .add_sprite("Cat", SpriteOptions::default());

    let start = h.add("events.on_start", props());
    let seq = h.add("control.sequence", props());
    let name = h.add("text.string", props().with("value", "Cat"));
    let turn = h.add("sprites.point_in_direction", props().with("degrees", 90.0));
    let step = h.add("sprites.move", props().with("steps", 25.0));
    let say = h.add("sprites.say", props().with("text", "Hi").with("duration", 500.0));
    let get_x = h.add("sprites.get_x", props());
    let store = h.add("variables.set", props().with("name", "x"));
    h.wire(start, "out", seq, "in");
    h.wire(seq, "1", turn, "in");
    h.wire(turn, "out", step, "in");
    h.wire(seq, "2", say, "in");
    h.wire(seq, "3", store, "in");
    for node in [turn, step, say, get_x] {
        h.wire(name, "out", node, "sprite");
    }
    h.wire(get_x, "x", store, "value");

    h.session.run();
    h.tick_after(16.0);

    {
        let stage = h.session.stage().borrow();
        let sprite = stage.sprite(cat).unwrap();
        assert!(close(sprite.x, 25.0));
        assert_eq!(sprite.speech(), Some("Hi"));
    }
    assert_eq!(h.session.vars().get("x"), Value::Number(25.0));

    h.clock.advance(600.0);
    h.session.frame().unwrap();
    assert_eq!(h.session.stage().borrow().sprite(cat).unwrap().speech(), None);
}

#[test]
fn actions_on_unknown_sprites_still_continue_the_chain() {
    let mut h = harness();
    let start = h.add("events.on_start", props());
    let name = h.add("text.string", props().with("value", "Nobody"));
    let step = h.add("sprites.move", props());
    let counter = h.add("variables.change", props().with("name", "after"));
    h.wire(start, "out", step, "in");
    h.wire(name, "out", step, "sprite");
    h.wire(step, "out", counter, "in");

    h.session.run();
    h.tick_after(16.0);
    assert_eq!(h.session.vars().get("after"), Value::Number(1.0));
}

#[test]
fn glide_node_fires_when_the_glide_time_has_passed() {
    let mut h = harness();
    let cat = h
        .session
        .stage()
        .borrow_mut()
        .add_sprite("Cat", SpriteOptions::default());
    let start = h.add("events.on_start", props());
    let get = h.add("sprites.get", props().with("name", "Cat"));
    let x = h.add("math.number", props().with("value", 100.0));
    let glide = h.add("sprites.glide", props().with("duration", 400.0));
    let done = h.add("variables.set", props().with("name", "arrived"));
    let yes = h.add("logic.boolean", props().with("value", true));
    h.wire(start, "out", glide, "in");
    h.wire(get, "sprite", glide, "sprite");
    h.wire(x, "out", glide, "x");
    h.wire(glide, "out", done, "in");
    h.wire(yes, "out", done, "value");

    h.session.run();
    h.tick_after(16.0);
    h.clock.advance(200.0);
    h.session.frame().unwrap();
    assert!(close(h.session.stage().borrow().sprite(cat).unwrap().x, 50.0));
    h.session.tick();
    assert_eq!(h.session.vars().get("arrived"), Value::Undefined);

    h.tick_after(250.0);
    h.session.frame().unwrap();
    assert_eq!(h.session.vars().get("arrived"), Value::Boolean(true));
    assert!(close(h.session.stage().borrow().sprite(cat).unwrap().x, 100.0));
}

#[test]
fn stopping_silences_every_sprite() {
    let mut h = harness();
    let cat = h
        .session
        .stage()
        .borrow_mut()
        .add_sprite("Cat", SpriteOptions::default());
    h.session.stage().borrow_mut().say(cat, "still here", 0.0);
    h.add("events.on_start", props());
    h.session.run();
    h.session.stop();
    assert_eq!(h.session.stage().borrow().sprite(cat).unwrap().speech(), None);
}

#[test]
fn pointer_drags_only_draggable_sprites() {
    let h = harness();
    let mut stage = h.session.stage().borrow_mut();
    let fixed = stage.add_sprite("Fixed", SpriteOptions::default());
    let loose = stage.add_sprite(
        "Loose",
        SpriteOptions {
            x: 100.0,
            draggable: true,
            ..SpriteOptions::default()
        },
    );

    assert_eq!(stage.pointer_down(0.0, 0.0), Some(fixed));
    assert_eq!(stage.dragging(), None);
    stage.pointer_up();

    assert_eq!(stage.pointer_down(100.0, 0.0), Some(loose));
    stage.pointer_move(40.0, -30.0);
    stage.pointer_up();
    let sprite = stage.sprite(loose).unwrap();
    assert_eq!((sprite.x, sprite.y), (40.0, -30.0));
    assert_eq!(stage.selected(), Some(loose));

    let (w, ht) = (stage.width(), stage.height());
    assert_eq!(stage.to_stage_coords(w / 2.0, ht / 2.0, w, ht), (0.0, 0.0));
    assert_eq!(stage.to_stage_coords(0.0, 0.0, w, ht), (-w / 2.0, ht / 2.0));
}

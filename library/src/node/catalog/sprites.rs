//! Sprite actions and queries.
//!
//! Actions resolve their `sprite` input at use time. A missing or unknown
//! sprite makes the action a no-op, and the `out` event still fires.

use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::{NodeEnv, NodeRegistry};
use crate::node::types::{action, event, inp, node, out, NodeCategory};
use crate::sprite::sprite::{Sprite, SpriteId};
use crate::sprite::stage::StageHandle;
use crate::value::Value;

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Sprites;
    let sprite_in = || inp("sprite", "Sprite", Sprite);

    registry.register(
        node("sprites.get", "Get Sprite", nc)
            .with_description("Looks a sprite up by name or id")
            .with_outputs(vec![out("sprite", "Sprite", Sprite)])
            .with_properties(PropertyMap::new().with("name", "Sprite1")),
        |env| Box::new(GetSprite { stage: env.stage.clone() }),
    );
    registry.register(
        node("sprites.move", "Move", nc)
            .with_inputs(vec![action(), sprite_in(), inp("steps", "Steps", Number)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("steps", 10.0)),
        |env| action_node(env, MoveSteps),
    );
    registry.register(
        node("sprites.go_to", "Go To", nc)
            .with_inputs(vec![action(), sprite_in(), inp("x", "X", Number), inp("y", "Y", Number)])
            .with_outputs(vec![event("out")]),
        |env| action_node(env, GoTo),
    );
    registry.register(
        node("sprites.glide", "Glide", nc)
            .with_description("Glides to a point; fires when the glide time has passed")
            .with_inputs(vec![
                action(),
                sprite_in(),
                inp("x", "X", Number),
                inp("y", "Y", Number),
                inp("ms", "ms", Number),
            ])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("duration", 1000.0)),
        |env| Box::new(Glide { stage: env.stage.clone() }),
    );
    registry.register(
        node("sprites.turn", "Turn", nc)
            .with_inputs(vec![action(), sprite_in(), inp("degrees", "Degrees", Number)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("degrees", 15.0)),
        |env| action_node(env, Turn),
    );
    registry.register(
        node("sprites.point_towards", "Point Towards", nc)
            .with_inputs(vec![action(), sprite_in(), inp("x", "X", Number), inp("y", "Y", Number)])
            .with_outputs(vec![event("out")]),
        |env| action_node(env, PointTowards),
    );
    registry.register(
        node("sprites.point_in_direction", "Point In Direction", nc)
            .with_inputs(vec![action(), sprite_in(), inp("degrees", "Degrees", Number)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("degrees", 90.0)),
        |env| action_node(env, PointInDirection),
    );
    registry.register(
        node("sprites.say", "Say", nc)
            .with_description("Shows a speech bubble; duration 0 keeps it")
            .with_inputs(vec![action(), sprite_in(), inp("text", "Text", String)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("text", "Hello!").with("duration", 0.0)),
        |env| action_node(env, Say),
    );
    registry.register(
        node("sprites.show", "Show", nc)
            .with_inputs(vec![action(), sprite_in()])
            .with_outputs(vec![event("out")]),
        |env| action_node(env, SetVisible(true)),
    );
    registry.register(
        node("sprites.hide", "Hide", nc)
            .with_inputs(vec![action(), sprite_in()])
            .with_outputs(vec![event("out")]),
        |env| action_node(env, SetVisible(false)),
    );
    registry.register(
        node("sprites.set_size", "Set Size", nc)
            .with_inputs(vec![action(), sprite_in(), inp("size", "Size %", Number)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("size", 100.0)),
        |env| action_node(env, SetSize),
    );
    registry.register(
        node("sprites.next_costume", "Next Costume", nc)
            .with_inputs(vec![action(), sprite_in()])
            .with_outputs(vec![event("out")]),
        |env| action_node(env, NextCostume),
    );
    registry.register(
        node("sprites.set_costume", "Set Costume", nc)
            .with_inputs(vec![action(), sprite_in(), inp("index", "Index", Number)])
            .with_outputs(vec![event("out")])
            .with_properties(PropertyMap::new().with("index", 0.0)),
        |env| action_node(env, SetCostume),
    );
    registry.register(
        node("sprites.get_x", "X Position", nc)
            .with_inputs(vec![sprite_in()])
            .with_outputs(vec![out("x", "X", Number)]),
        |env| Box::new(Position { stage: env.stage.clone(), pin: "x", read: |s| s.x }),
    );
    registry.register(
        node("sprites.get_y", "Y Position", nc)
            .with_inputs(vec![sprite_in()])
            .with_outputs(vec![out("y", "Y", Number)]),
        |env| Box::new(Position { stage: env.stage.clone(), pin: "y", read: |s| s.y }),
    );
}

/// Finds the sprite a value refers to: a sprite reference, or a name/id.
fn resolve(stage: &StageHandle, value: &Value) -> Option<SpriteId> {
    let stage = stage.borrow();
    match value {
        Value::Sprite(id) => stage.sprite(*id).map(|s| s.id),
        Value::String(key) => stage.find(key),
        _ => None,
    }
}

/// One mutation applied to a resolved sprite. Inputs are read before the
/// stage is borrowed.
trait SpriteAction {
    type Args;

    fn read(&self, ctx: &mut NodeContext<'_>) -> Self::Args;

    fn apply(&self, sprite: &mut Sprite, args: Self::Args, now: f64);
}

struct ActionNode<A> {
    stage: StageHandle,
    action: A,
}

fn action_node<A: SpriteAction + 'static>(env: &NodeEnv, action: A) -> Box<dyn NodeBehavior> {
    Box::new(ActionNode {
        stage: env.stage.clone(),
        action,
    })
}

impl<A: SpriteAction> NodeBehavior for ActionNode<A> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let target = ctx.input("sprite");
        let args = self.action.read(ctx);
        if let Some(id) = resolve(&self.stage, &target) {
            let mut stage = self.stage.borrow_mut();
            let now = stage.now();
            if let Some(sprite) = stage.sprite_mut(id) {
                self.action.apply(sprite, args, now);
            }
        }
        ctx.fire("out");
        Ok(())
    }
}

struct MoveSteps;

impl SpriteAction for MoveSteps {
    type Args = f64;

    fn read(&self, ctx: &mut NodeContext<'_>) -> f64 {
        ctx.input_number_or_property("steps", "steps", 10.0)
    }

    fn apply(&self, sprite: &mut Sprite, steps: f64, _now: f64) {
        sprite.move_steps(steps);
    }
}

struct GoTo;

impl SpriteAction for GoTo {
    type Args = (f64, f64);

    fn read(&self, ctx: &mut NodeContext<'_>) -> (f64, f64) {
        (ctx.input_number("x", 0.0), ctx.input_number("y", 0.0))
    }

    fn apply(&self, sprite: &mut Sprite, (x, y): (f64, f64), _now: f64) {
        sprite.go_to(x, y);
    }
}

struct Turn;

impl SpriteAction for Turn {
    type Args = f64;

    fn read(&self, ctx: &mut NodeContext<'_>) -> f64 {
        ctx.input_number_or_property("degrees", "degrees", 15.0)
    }

    fn apply(&self, sprite: &mut Sprite, degrees: f64, _now: f64) {
        sprite.turn(degrees);
    }
}

struct PointTowards;

impl SpriteAction for PointTowards {
    type Args = (f64, f64);

    fn read(&self, ctx: &mut NodeContext<'_>) -> (f64, f64) {
        (ctx.input_number("x", 0.0), ctx.input_number("y", 0.0))
    }

    fn apply(&self, sprite: &mut Sprite, (x, y): (f64, f64), _now: f64) {
        sprite.point_towards(x, y);
    }
}

struct PointInDirection;

impl SpriteAction for PointInDirection {
    type Args = f64;

    fn read(&self, ctx: &mut NodeContext<'_>) -> f64 {
        ctx.input_number_or_property("degrees", "degrees", 90.0)
    }

    fn apply(&self, sprite: &mut Sprite, degrees: f64, _now: f64) {
        sprite.point_in_direction(degrees);
    }
}

struct Say;

impl SpriteAction for Say {
    type Args = (String, f64);

    fn read(&self, ctx: &mut NodeContext<'_>) -> (String, f64) {
        let fallback = ctx.property("text");
        let text = ctx.input_or("text", fallback);
        let text = if text.is_nullish() { String::new() } else { text.to_display_string() };
        (text, ctx.property_number("duration", 0.0))
    }

    fn apply(&self, sprite: &mut Sprite, (text, duration): (String, f64), now: f64) {
        sprite.say(&text, duration, now);
    }
}

struct SetVisible(bool);

impl SpriteAction for SetVisible {
    type Args = ();

    fn read(&self, _ctx: &mut NodeContext<'_>) {}

    fn apply(&self, sprite: &mut Sprite, _args: (), _now: f64) {
        sprite.visible = self.0;
    }
}

struct SetSize;

impl SpriteAction for SetSize {
    type Args = f64;

    fn read(&self, ctx: &mut NodeContext<'_>) -> f64 {
        ctx.input_number_or_property("size", "size", 100.0) / 100.0
    }

    fn apply(&self, sprite: &mut Sprite, scale: f64, _now: f64) {
        sprite.scale_x = scale;
        sprite.scale_y = scale;
    }
}

struct NextCostume;

impl SpriteAction for NextCostume {
    type Args = ();

    fn read(&self, _ctx: &mut NodeContext<'_>) {}

    fn apply(&self, sprite: &mut Sprite, _args: (), _now: f64) {
        sprite.next_costume();
    }
}

struct SetCostume;

impl SpriteAction for SetCostume {
    type Args = f64;

    fn read(&self, ctx: &mut NodeContext<'_>) -> f64 {
        ctx.input_number_or_property("index", "index", 0.0)
    }

    fn apply(&self, sprite: &mut Sprite, index: f64, _now: f64) {
        if index >= 0.0 {
            sprite.set_costume(index.floor() as usize);
        }
    }
}

/// Starts a glide and fires `out` once its duration has passed on the
/// executor clock.
struct Glide {
    stage: StageHandle,
}

impl NodeBehavior for Glide {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PUSH
    }

    fn on_action(&mut self, _action: &str, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let target = ctx.input("sprite");
        let x = ctx.input_number("x", 0.0);
        let y = ctx.input_number("y", 0.0);
        let duration = ctx.input_number_or_property("ms", "duration", 1000.0).max(0.0);
        let started = resolve(&self.stage, &target)
            .and_then(|id| self.stage.borrow_mut().glide_to(id, x, y, duration))
            .is_some();
        if started && duration > 0.0 {
            ctx.schedule_fire(duration, "out");
        } else {
            ctx.fire("out");
        }
        Ok(())
    }
}

struct GetSprite {
    stage: StageHandle,
}

impl NodeBehavior for GetSprite {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let name = ctx.property_string("name", "Sprite1");
        let found = self.stage.borrow().find(&name);
        ctx.set_output("sprite", found.map(Value::Sprite).unwrap_or_default());
        Ok(())
    }
}

struct Position {
    stage: StageHandle,
    pin: &'static str,
    read: fn(&Sprite) -> f64,
}

impl NodeBehavior for Position {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let target = ctx.input("sprite");
        let value = resolve(&self.stage, &target)
            .and_then(|id| self.stage.borrow().sprite(id).map(self.read))
            .unwrap_or(0.0);
        ctx.set_output(self.pin, value);
        Ok(())
    }
}

//! Event sources: the only nodes that fire without an incoming action.

use crate::clock::ClockHandle;
use crate::error::LibraryError;
use crate::graph::connection::DataType;
use crate::graph::property::PropertyMap;
use crate::node::behavior::{Capabilities, InputEvent, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::NodeRegistry;
use crate::node::types::{event, node, out, NodeCategory};

pub(super) fn register(registry: &mut NodeRegistry) {
    use DataType::*;
    let nc = NodeCategory::Events;

    registry.register(
        node("events.on_start", "On Start", nc)
            .with_description("Fires once when the program starts")
            .with_outputs(vec![event("out")]),
        |_| Box::new(OnStart::default()),
    );
    registry.register(
        node("events.on_update", "On Update", nc)
            .with_description("Fires every tick")
            .with_outputs(vec![event("out"), out("dt", "dt", Number)]),
        |env| Box::new(OnUpdate::new(env.clock.clone())),
    );
    registry.register(
        node("events.timer", "Timer", nc)
            .with_description("Fires at most once per interval")
            .with_outputs(vec![event("out"), out("count", "Count", Number)])
            .with_properties(PropertyMap::new().with("interval", 1000.0)),
        |env| Box::new(Timer::new(env.clock.clone())),
    );
    registry.register(
        node("events.button", "Button", nc)
            .with_description("Fires when clicked")
            .with_outputs(vec![event("out"), out("clicks", "Clicks", Number)]),
        |_| Box::new(Button::default()),
    );
    registry.register(
        node("events.on_key", "On Key", nc)
            .with_description("Fires on the next tick after a matching key press")
            .with_outputs(vec![event("out"), out("key", "Key", String)])
            .with_properties(PropertyMap::new().with("key", "")),
        |_| Box::new(OnKey::default()),
    );
}

#[derive(Default)]
struct OnStart {
    fired: bool,
}

impl NodeBehavior for OnStart {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::RESET
    }

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.fired = false;
        Ok(())
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        if !self.fired {
            self.fired = true;
            ctx.fire("out");
        }
        Ok(())
    }
}

struct OnUpdate {
    last: f64,
}

impl OnUpdate {
    fn new(clock: ClockHandle) -> Self {
        Self { last: clock.now_ms() }
    }
}

impl NodeBehavior for OnUpdate {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::RESET
    }

    fn on_start(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.last = ctx.now();
        Ok(())
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let now = ctx.now();
        ctx.set_output("dt", now - self.last);
        self.last = now;
        ctx.fire("out");
        Ok(())
    }
}

struct Timer {
    last: f64,
    count: u64,
}

impl Timer {
    fn new(clock: ClockHandle) -> Self {
        Self {
            last: clock.now_ms(),
            count: 0,
        }
    }
}

impl NodeBehavior for Timer {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::RESET
    }

    fn on_start(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.last = ctx.now();
        self.count = 0;
        Ok(())
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        let interval = ctx.property_number("interval", 1000.0).max(1.0);
        let now = ctx.now();
        if now - self.last >= interval {
            self.last = now;
            self.count += 1;
            ctx.set_output("count", self.count as f64);
            ctx.fire("out");
        }
        Ok(())
    }
}

#[derive(Default)]
struct Button {
    clicks: u64,
}

impl NodeBehavior for Button {
    fn capabilities(&self) -> Capabilities {
        Capabilities::INPUT | Capabilities::RESET
    }

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.clicks = 0;
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        if *event == InputEvent::Click {
            self.clicks += 1;
            ctx.set_output("clicks", self.clicks as f64);
            ctx.fire("out");
        }
        Ok(())
    }
}

/// Latches the last matching key press and fires it on the next tick.
#[derive(Default)]
struct OnKey {
    pressed: Option<String>,
}

impl NodeBehavior for OnKey {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PULL | Capabilities::RESET | Capabilities::INPUT
    }

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        self.pressed = None;
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        if let InputEvent::KeyDown { key, code } = event {
            let filter = ctx.property_string("key", "").to_lowercase();
            if filter.is_empty() || key.to_lowercase() == filter || code.to_lowercase() == filter {
                self.pressed = Some(key.clone());
            }
        }
        Ok(())
    }

    fn on_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        if let Some(key) = self.pressed.take() {
            ctx.set_output("key", key);
            ctx.fire("out");
        }
        Ok(())
    }

    fn on_unsubscribed(&mut self) {
        self.pressed = None;
    }

    fn on_removed(&mut self) {
        self.pressed = None;
    }
}

//! The hooks a node type implements to take part in a running program.

use bitflags::bitflags;

use crate::error::LibraryError;
use crate::node::context::NodeContext;

bitflags! {
    /// Hooks a node declares; the executor only calls declared ones.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// `on_execute` once per tick.
        const PULL = 1;
        /// `on_action` when an upstream event fires into it.
        const PUSH = 1 << 1;
        /// `on_start` when a run begins.
        const RESET = 1 << 2;
        /// `on_input` for device events while a run is active, and for
        /// clicks targeted at the node.
        const INPUT = 1 << 3;
        /// Output differs between calls with the same inputs. Such a node
        /// is refreshed by the tick pass only, so every read within a tick
        /// sees the same value.
        const VOLATILE = 1 << 4;
    }
}

/// A device event delivered to `INPUT` nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown { key: String, code: String },
    /// The node's own button was pressed.
    Click,
}

impl InputEvent {
    pub fn key(key: &str, code: &str) -> Self {
        InputEvent::KeyDown {
            key: key.to_string(),
            code: code.to_string(),
        }
    }
}

/// Behavior of one placed node.
///
/// Every hook returns `Ok(())` by default. An `Err` is reported to the log
/// sink and the executor moves on to the next node; arithmetic edge cases
/// should resolve to a fallback value instead of erroring.
pub trait NodeBehavior {
    fn capabilities(&self) -> Capabilities;

    /// Resets run state. Not called for single steps.
    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        Ok(())
    }

    /// Refreshes outputs. Pure nodes must keep this idempotent.
    fn on_execute(&mut self, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        Ok(())
    }

    /// `action` is the name of the input pin that was triggered.
    fn on_action(&mut self, _action: &str, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        Ok(())
    }

    fn on_input(&mut self, _event: &InputEvent, _ctx: &mut NodeContext<'_>) -> Result<(), LibraryError> {
        Ok(())
    }

    /// Called when a run ends and the node's device subscription closes.
    /// Input latched but not yet delivered must be dropped here.
    fn on_unsubscribed(&mut self) {}

    /// Called once when the node is taken out of the graph.
    fn on_removed(&mut self) {}

    /// Short text shown on the node body, if any.
    fn display(&self) -> Option<String> {
        None
    }
}

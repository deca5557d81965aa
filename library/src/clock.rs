//! Time sources shared by the executor and the stage.
//!
//! Every timing decision (timers, waits, glides, speech expiry) reads a
//! [`Clock`] instead of the wall clock directly, so tests can advance time by
//! hand with [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub type ClockHandle = Rc<dyn Clock>;

/// Real time, measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Simulated time that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to the
/// executor and stage and keep another to drive it.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let shared: ClockHandle = Rc::new(clock.clone());
        clock.advance(250.0);
        assert_eq!(shared.now_ms(), 250.0);
        clock.set(10.0);
        assert_eq!(shared.now_ms(), 10.0);
    }
}

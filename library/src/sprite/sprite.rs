//! Sprite actor: transform, costumes, speech and glides.
//!
//! Coordinates are stage-centred with y pointing up. Heading 0° points up
//! and headings grow clockwise, so 90° points right.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::LibraryError;
use crate::sprite::costume::{Costume, LoadPoll, PendingCostume};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SpriteId(pub Uuid);

impl SpriteId {
    pub fn new() -> Self {
        SpriteId(Uuid::new_v4())
    }
}

impl Default for SpriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SpriteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SpriteId)
    }
}

/// Initial attributes for a new sprite.
#[derive(Clone, Debug)]
pub struct SpriteOptions {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub visible: bool,
    pub opacity: f64,
    pub draggable: bool,
    /// Drawn (by hosts with a text engine) when no costume is loaded.
    pub glyph: String,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: true,
            opacity: 1.0,
            draggable: false,
            glyph: "😀".to_string(),
        }
    }
}

/// How a sprite currently looks.
pub enum Appearance<'a> {
    Costume(&'a Costume),
    /// No costume yet; `loading` tells whether one is on its way.
    Fallback { glyph: &'a str, loading: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlideOutcome {
    Arrived,
    /// Replaced by another glide or a direct move before finishing.
    Interrupted,
}

/// Completion signal of a glide. Await it, or poll it with [`GlideHandle::outcome`].
pub struct GlideHandle {
    receiver: oneshot::Receiver<GlideOutcome>,
    outcome: Option<GlideOutcome>,
}

impl GlideHandle {
    fn new(receiver: oneshot::Receiver<GlideOutcome>) -> Self {
        Self {
            receiver,
            outcome: None,
        }
    }

    /// `None` while the glide is still running.
    pub fn outcome(&mut self) -> Option<GlideOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.receiver.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(GlideOutcome::Interrupted),
            };
        }
        self.outcome
    }
}

impl Future for GlideHandle {
    type Output = GlideOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|r| r.unwrap_or(GlideOutcome::Interrupted))
    }
}

struct Glide {
    from: (f64, f64),
    to: (f64, f64),
    started_at: f64,
    duration: f64,
    done: Option<oneshot::Sender<GlideOutcome>>,
}

impl Glide {
    fn finish(&mut self, outcome: GlideOutcome) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(outcome);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Speech {
    text: String,
    /// Stage-clock time at which the text disappears; `None` keeps it.
    clear_at: Option<f64>,
}

pub struct Sprite {
    pub id: SpriteId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Degrees, unbounded.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub visible: bool,
    pub opacity: f64,
    pub draggable: bool,
    pub glyph: String,
    costumes: Vec<Costume>,
    current_costume: usize,
    pending: VecDeque<PendingCostume>,
    /// Costume index to select once every pending load has settled.
    deferred_costume_index: Option<usize>,
    speech: Option<Speech>,
    glide: Option<Glide>,
    fallback_size: f64,
}

impl Sprite {
    pub fn new(name: &str, options: SpriteOptions) -> Self {
        Self {
            id: SpriteId::new(),
            name: if name.is_empty() { "Sprite".to_string() } else { name.to_string() },
            x: options.x,
            y: options.y,
            rotation: options.rotation,
            scale_x: options.scale_x,
            scale_y: options.scale_y,
            visible: options.visible,
            opacity: options.opacity,
            draggable: options.draggable,
            glyph: options.glyph,
            costumes: Vec::new(),
            current_costume: 0,
            pending: VecDeque::new(),
            deferred_costume_index: None,
            speech: None,
            glide: None,
            fallback_size: 50.0,
        }
    }

    pub fn with_fallback_size(mut self, size: f64) -> Self {
        self.fallback_size = size;
        self
    }

    // ---- costumes ----

    pub fn costume(&self) -> Option<&Costume> {
        self.costumes.get(self.current_costume)
    }

    pub fn costumes(&self) -> &[Costume] {
        &self.costumes
    }

    pub fn current_costume_index(&self) -> usize {
        self.current_costume
    }

    pub fn pending_costumes(&self) -> impl Iterator<Item = &PendingCostume> {
        self.pending.iter()
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn appearance(&self) -> Appearance<'_> {
        match self.costume() {
            Some(costume) => Appearance::Costume(costume),
            None => Appearance::Fallback {
                glyph: &self.glyph,
                loading: self.is_loading(),
            },
        }
    }

    /// Active costume's clamped size times scale, or the fallback square.
    pub fn display_size(&self) -> (f64, f64) {
        match self.costume() {
            Some(c) => (c.width * self.scale_x, c.height * self.scale_y),
            None => (self.fallback_size * self.scale_x, self.fallback_size * self.scale_y),
        }
    }

    /// Appends a decoded costume; the first one becomes active.
    pub fn push_costume(&mut self, costume: Costume) {
        self.costumes.push(costume);
        if self.costumes.len() == 1 {
            self.current_costume = 0;
        }
    }

    pub fn queue_costume(&mut self, pending: PendingCostume) {
        self.pending.push_back(pending);
    }

    /// Selects `index` after all queued loads settle (used when restoring).
    pub fn select_costume_when_loaded(&mut self, index: usize) {
        if self.pending.is_empty() {
            self.set_costume(index);
        } else {
            self.deferred_costume_index = Some(index);
        }
    }

    /// Applies finished loads in request order. A load still in flight
    /// holds back the ones queued after it. Failed loads are returned.
    pub fn poll_costumes(&mut self) -> Vec<(String, LibraryError)> {
        let mut failures = Vec::new();
        while let Some(front) = self.pending.front_mut() {
            match front.poll() {
                LoadPoll::Pending => break,
                LoadPoll::Ready(result) => {
                    let source = front.source.clone();
                    self.pending.pop_front();
                    match result {
                        Ok(costume) => self.push_costume(costume),
                        Err(e) => failures.push((source, e)),
                    }
                }
            }
        }
        self.settle_deferred_index();
        failures
    }

    /// Blocks until every queued load has finished.
    pub fn wait_costumes(&mut self) -> Vec<(String, LibraryError)> {
        let mut failures = Vec::new();
        while let Some(pending) = self.pending.pop_front() {
            let source = pending.source.clone();
            match pending.wait() {
                Ok(costume) => self.push_costume(costume),
                Err(e) => failures.push((source, e)),
            }
        }
        self.settle_deferred_index();
        failures
    }

    fn settle_deferred_index(&mut self) {
        if self.pending.is_empty() {
            if let Some(index) = self.deferred_costume_index.take() {
                self.set_costume(index);
            }
        }
    }

    /// No-op when `index` is out of range.
    pub fn set_costume(&mut self, index: usize) {
        if index < self.costumes.len() {
            self.current_costume = index;
        }
    }

    /// Cycles to the next costume; no-op without costumes.
    pub fn next_costume(&mut self) {
        if !self.costumes.is_empty() {
            self.current_costume = (self.current_costume + 1) % self.costumes.len();
        }
    }

    // ---- motion ----

    /// Moves along the current heading.
    pub fn move_steps(&mut self, steps: f64) {
        let rad = (self.rotation - 90.0).to_radians();
        // Screen-space heading, converted to the y-up stage.
        self.x += rad.cos() * steps;
        self.y -= rad.sin() * steps;
        self.interrupt_glide();
    }

    pub fn go_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.interrupt_glide();
    }

    /// Starts a linear glide measured against `now` (stage clock, ms).
    /// A running glide is interrupted. Non-positive durations arrive at once.
    pub fn glide_to(&mut self, x: f64, y: f64, duration_ms: f64, now: f64) -> GlideHandle {
        self.interrupt_glide();
        let (tx, rx) = oneshot::channel();
        if !(duration_ms > 0.0) {
            self.x = x;
            self.y = y;
            let _ = tx.send(GlideOutcome::Arrived);
        } else {
            self.glide = Some(Glide {
                from: (self.x, self.y),
                to: (x, y),
                started_at: now,
                duration: duration_ms,
                done: Some(tx),
            });
        }
        GlideHandle::new(rx)
    }

    pub fn is_gliding(&self) -> bool {
        self.glide.is_some()
    }

    fn interrupt_glide(&mut self) {
        if let Some(mut glide) = self.glide.take() {
            glide.finish(GlideOutcome::Interrupted);
        }
    }

    pub fn turn(&mut self, degrees: f64) {
        self.rotation += degrees;
    }

    pub fn point_in_direction(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    /// Turns so the heading faces `(x, y)`.
    pub fn point_towards(&mut self, x: f64, y: f64) {
        let dx = x - self.x;
        let dy = y - self.y;
        self.rotation = dx.atan2(dy).to_degrees();
    }

    // ---- speech ----

    /// Shows `text`; a positive `duration_ms` clears it that long after
    /// `now`. Any earlier pending clear is replaced.
    pub fn say(&mut self, text: &str, duration_ms: f64, now: f64) {
        if text.is_empty() {
            self.speech = None;
            return;
        }
        let clear_at = if duration_ms > 0.0 { Some(now + duration_ms) } else { None };
        self.speech = Some(Speech {
            text: text.to_string(),
            clear_at,
        });
    }

    pub fn speech(&self) -> Option<&str> {
        self.speech.as_ref().map(|s| s.text.as_str())
    }

    pub fn clear_speech(&mut self) {
        self.speech = None;
    }

    /// Advances time-driven state (glide position, speech expiry) to `now`.
    pub fn advance(&mut self, now: f64) {
        if let Some(glide) = self.glide.as_mut() {
            let progress = ((now - glide.started_at) / glide.duration).clamp(0.0, 1.0);
            self.x = glide.from.0 + (glide.to.0 - glide.from.0) * progress;
            self.y = glide.from.1 + (glide.to.1 - glide.from.1) * progress;
            if progress >= 1.0 {
                glide.finish(GlideOutcome::Arrived);
                self.glide = None;
            }
        }
        if let Some(Speech { clear_at: Some(at), .. }) = self.speech {
            if now >= at {
                self.speech = None;
            }
        }
    }

    /// Axis-aligned hit test against the display bounds.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        let (w, h) = self.display_size();
        let (half_w, half_h) = (w / 2.0, h / 2.0);
        px >= self.x - half_w && px <= self.x + half_w && py >= self.y - half_h && py <= self.y + half_h
    }

    /// Back to the origin, facing up, silent.
    pub fn reset(&mut self) {
        self.interrupt_glide();
        self.x = 0.0;
        self.y = 0.0;
        self.rotation = 0.0;
        self.speech = None;
    }
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("rotation", &self.rotation)
            .field("costumes", &self.costumes.len())
            .field("speech", &self.speech())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn heading_zero_moves_up() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        s.move_steps(10.0);
        assert!(approx(s.x, 0.0));
        assert!(approx(s.y, 10.0));
    }

    #[test]
    fn heading_ninety_moves_right() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        s.turn(90.0);
        s.move_steps(5.0);
        assert!(approx(s.x, 5.0));
        assert!(approx(s.y, 0.0));
    }

    #[test]
    fn turn_is_not_normalized() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        s.turn(300.0);
        s.turn(300.0);
        assert_eq!(s.rotation, 600.0);
    }

    #[test]
    fn point_towards_then_move_reaches_target_direction() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        s.go_to(10.0, 10.0);
        s.point_towards(10.0, 0.0);
        assert!(approx(s.rotation, 180.0));
        s.point_towards(20.0, 10.0);
        assert!(approx(s.rotation, 90.0));
        s.move_steps(3.0);
        assert!(approx(s.x, 13.0));
    }

    #[test]
    fn glide_interpolates_and_resolves() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        let mut handle = s.glide_to(100.0, -50.0, 1000.0, 0.0);
        s.advance(500.0);
        assert!(approx(s.x, 50.0));
        assert!(approx(s.y, -25.0));
        assert_eq!(handle.outcome(), None);
        s.advance(1200.0);
        assert_eq!((s.x, s.y), (100.0, -50.0));
        assert_eq!(handle.outcome(), Some(GlideOutcome::Arrived));
        assert!(!s.is_gliding());
    }

    #[test]
    fn go_to_interrupts_glide() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        let mut handle = s.glide_to(100.0, 0.0, 1000.0, 0.0);
        s.go_to(1.0, 2.0);
        s.advance(500.0);
        assert_eq!((s.x, s.y), (1.0, 2.0));
        assert_eq!(handle.outcome(), Some(GlideOutcome::Interrupted));
    }

    #[test]
    fn zero_duration_glide_arrives_immediately() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        let mut handle = s.glide_to(7.0, 8.0, 0.0, 0.0);
        assert_eq!((s.x, s.y), (7.0, 8.0));
        assert_eq!(handle.outcome(), Some(GlideOutcome::Arrived));
    }

    #[test]
    fn costume_index_changes_are_bounded() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        s.next_costume();
        s.set_costume(3);
        assert_eq!(s.current_costume_index(), 0);
        assert!(s.costume().is_none());
        assert_eq!(s.display_size(), (50.0, 50.0));
    }

    #[test]
    fn fallback_size_scales() {
        let mut s = Sprite::new("cat", SpriteOptions::default());
        s.scale_x = 2.0;
        s.scale_y = 0.5;
        assert_eq!(s.display_size(), (100.0, 25.0));
        assert!(s.contains_point(49.0, 12.0));
        assert!(!s.contains_point(51.0, 0.0));
    }
}

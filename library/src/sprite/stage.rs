//! The stage: ordered sprites, background, selection and pointer dragging.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::clock::ClockHandle;
use crate::config::RuntimeConfig;
use crate::error::LibraryError;
use crate::logging::{LogHandle, Severity};
use crate::sprite::costume::{decode_costume, Costume, PendingCostume};
use crate::sprite::snapshot::{CostumeRef, SpriteSnapshot, StageSnapshot};
use crate::sprite::sprite::{GlideHandle, Sprite, SpriteId, SpriteOptions};

pub type StageHandle = Rc<RefCell<Stage>>;

pub struct Stage {
    /// Draw order: later sprites are on top.
    sprites: Vec<Sprite>,
    selected: Option<SpriteId>,
    dragging: Option<SpriteId>,
    pub background_color: String,
    background_image: Option<Costume>,
    width: f64,
    height: f64,
    default_background: String,
    max_costume_size: f64,
    fallback_size: f64,
    clock: ClockHandle,
    log: LogHandle,
}

impl Stage {
    pub fn new(config: &RuntimeConfig, clock: ClockHandle, log: LogHandle) -> Self {
        Self {
            sprites: Vec::new(),
            selected: None,
            dragging: None,
            background_color: config.stage.background.clone(),
            background_image: None,
            width: config.stage.width as f64,
            height: config.stage.height as f64,
            default_background: config.stage.background.clone(),
            max_costume_size: config.sprite.max_costume_size,
            fallback_size: config.sprite.fallback_size,
            clock,
            log,
        }
    }

    pub fn into_handle(self) -> StageHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Current stage-clock time in milliseconds.
    pub fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> ClockHandle {
        self.clock.clone()
    }

    // ---- sprites ----

    pub fn add_sprite(&mut self, name: &str, options: SpriteOptions) -> SpriteId {
        let sprite = Sprite::new(name, options).with_fallback_size(self.fallback_size);
        let id = sprite.id;
        debug!("Added sprite '{}' ({})", sprite.name, id);
        self.sprites.push(sprite);
        id
    }

    pub fn remove_sprite(&mut self, id: SpriteId) -> bool {
        let Some(index) = self.sprites.iter().position(|s| s.id == id) else {
            return false;
        };
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.dragging == Some(id) {
            self.dragging = None;
        }
        self.sprites.remove(index);
        true
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    pub fn sprite_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.id == id)
    }

    pub fn sprite_by_index(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    /// First sprite whose id or name equals `key`.
    pub fn find(&self, key: &str) -> Option<SpriteId> {
        self.sprites
            .iter()
            .find(|s| s.id.to_string() == key || s.name == key)
            .map(|s| s.id)
    }

    /// Topmost visible sprite under a stage point.
    pub fn sprite_at(&self, x: f64, y: f64) -> Option<SpriteId> {
        self.sprites
            .iter()
            .rev()
            .find(|s| s.visible && s.contains_point(x, y))
            .map(|s| s.id)
    }

    pub fn select(&mut self, id: Option<SpriteId>) {
        self.selected = id.filter(|id| self.sprite(*id).is_some());
    }

    pub fn selected(&self) -> Option<SpriteId> {
        self.selected
    }

    /// Removes every sprite and restores the default background.
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.selected = None;
        self.dragging = None;
        self.background_color = self.default_background.clone();
        self.background_image = None;
    }

    /// Puts every sprite back at the origin, facing up, with no speech.
    pub fn reset_sprites(&mut self) {
        for sprite in &mut self.sprites {
            sprite.reset();
        }
    }

    pub fn clear_speech(&mut self) {
        for sprite in &mut self.sprites {
            sprite.clear_speech();
        }
    }

    // ---- actions routed through the stage clock ----

    pub fn say(&mut self, id: SpriteId, text: &str, duration_ms: f64) {
        let now = self.now();
        if let Some(sprite) = self.sprite_mut(id) {
            sprite.say(text, duration_ms, now);
        }
    }

    pub fn glide_to(&mut self, id: SpriteId, x: f64, y: f64, duration_ms: f64) -> Option<GlideHandle> {
        let now = self.now();
        self.sprite_mut(id).map(|s| s.glide_to(x, y, duration_ms, now))
    }

    // ---- costumes ----

    /// Starts decoding `source` in the background. The costume is appended
    /// once [`Stage::update`] sees the decode finish.
    pub fn load_costume(&mut self, id: SpriteId, source: &str, name: &str) -> Result<(), LibraryError> {
        let max = self.max_costume_size;
        let sprite = self
            .sprite_mut(id)
            .ok_or_else(|| LibraryError::runtime(format!("no sprite {}", id)))?;
        sprite.queue_costume(PendingCostume::spawn(source, name, max));
        Ok(())
    }

    /// Appends an already-decoded costume, behind any loads still pending.
    pub fn add_costume(&mut self, id: SpriteId, costume: Costume) -> Result<(), LibraryError> {
        let sprite = self
            .sprite_mut(id)
            .ok_or_else(|| LibraryError::runtime(format!("no sprite {}", id)))?;
        let (name, source) = (costume.name.clone(), costume.source.clone());
        sprite.queue_costume(PendingCostume::ready(&name, &source, Ok(costume)));
        sprite.poll_costumes();
        Ok(())
    }

    pub fn set_background_image(&mut self, source: &str) -> Result<(), LibraryError> {
        let image = decode_costume(source, "background", f64::INFINITY)?;
        self.background_image = Some(image);
        Ok(())
    }

    pub fn clear_background_image(&mut self) {
        self.background_image = None;
    }

    pub fn background_image(&self) -> Option<&Costume> {
        self.background_image.as_ref()
    }

    /// Applies finished costume loads, then advances glides and speech
    /// timers to the current stage time. Called once per rendered frame.
    pub fn update(&mut self) {
        let now = self.now();
        for sprite in &mut self.sprites {
            for (source, err) in sprite.poll_costumes() {
                report_load_failure(&self.log, &sprite.name, &source, &err);
            }
            sprite.advance(now);
        }
    }

    /// Blocks until every pending costume load has finished.
    pub fn finish_loads(&mut self) {
        for sprite in &mut self.sprites {
            for (source, err) in sprite.wait_costumes() {
                report_load_failure(&self.log, &sprite.name, &source, &err);
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.sprites.iter().any(Sprite::is_loading)
    }

    // ---- pointer ----

    /// Maps a point on a canvas of the given size to stage coordinates.
    pub fn to_stage_coords(&self, canvas_x: f64, canvas_y: f64, canvas_w: f64, canvas_h: f64) -> (f64, f64) {
        let sx = if canvas_w > 0.0 { self.width / canvas_w } else { 1.0 };
        let sy = if canvas_h > 0.0 { self.height / canvas_h } else { 1.0 };
        (canvas_x * sx - self.width / 2.0, self.height / 2.0 - canvas_y * sy)
    }

    /// Selects the topmost sprite under the pointer and starts dragging it
    /// when it is draggable. Returns the hit sprite.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<SpriteId> {
        let hit = self.sprite_at(x, y)?;
        if self.sprite(hit).is_some_and(|s| s.draggable) {
            self.dragging = Some(hit);
        }
        self.selected = Some(hit);
        Some(hit)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(id) = self.dragging {
            if let Some(sprite) = self.sprite_mut(id) {
                sprite.go_to(x, y);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.dragging = None;
    }

    pub fn dragging(&self) -> Option<SpriteId> {
        self.dragging
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            background_color: self.background_color.clone(),
            sprites: self.sprites.iter().map(snapshot_sprite).collect(),
        }
    }

    /// Replaces all sprites with those in `snapshot`. Costume images are
    /// reloaded in the background and the saved costume index is applied
    /// once they have all settled.
    pub fn restore(&mut self, snapshot: &StageSnapshot) {
        self.clear();
        self.background_color = snapshot.background_color.clone();
        for data in &snapshot.sprites {
            let mut options = SpriteOptions {
                x: data.x,
                y: data.y,
                rotation: data.rotation,
                scale_x: data.scale_x,
                scale_y: data.scale_y,
                visible: data.visible,
                opacity: data.opacity,
                draggable: data.draggable,
                ..SpriteOptions::default()
            };
            if let Some(glyph) = &data.glyph {
                options.glyph = glyph.clone();
            }
            let mut sprite = Sprite::new(&data.name, options).with_fallback_size(self.fallback_size);
            match data.id.as_deref().map(str::parse::<SpriteId>) {
                Some(Ok(id)) => sprite.id = id,
                Some(Err(_)) => warn!("Sprite '{}' has a malformed id; assigning a new one", data.name),
                None => {}
            }
            for costume in &data.costumes {
                sprite.queue_costume(PendingCostume::spawn(&costume.src, &costume.name, self.max_costume_size));
            }
            if let Some(index) = data.current_costume_index {
                sprite.select_costume_when_loaded(index);
            }
            self.sprites.push(sprite);
        }
        debug!("Restored stage with {} sprite(s)", self.sprites.len());
    }
}

fn snapshot_sprite(sprite: &Sprite) -> SpriteSnapshot {
    let mut costumes: Vec<CostumeRef> = sprite
        .costumes()
        .iter()
        .map(|c| CostumeRef {
            name: c.name.clone(),
            src: c.source.clone(),
            width: c.width,
            height: c.height,
        })
        .collect();
    // Loads still in flight keep their place so a quick save loses nothing.
    costumes.extend(sprite.pending_costumes().map(|p| CostumeRef {
        name: p.name.clone(),
        src: p.source.clone(),
        width: 0.0,
        height: 0.0,
    }));
    SpriteSnapshot {
        id: Some(sprite.id.to_string()),
        name: sprite.name.clone(),
        x: sprite.x,
        y: sprite.y,
        rotation: sprite.rotation,
        scale_x: sprite.scale_x,
        scale_y: sprite.scale_y,
        visible: sprite.visible,
        opacity: sprite.opacity,
        draggable: sprite.draggable,
        glyph: Some(sprite.glyph.clone()),
        current_costume_index: Some(sprite.current_costume_index()),
        costumes,
    }
}

fn report_load_failure(log: &LogHandle, sprite: &str, source: &str, err: &LibraryError) {
    warn!("Failed to load costume '{}' for '{}': {}", source, sprite, err);
    log.log(&format!("Failed to load costume '{}': {}", source, err), Severity::Warn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::logging::MemoryLog;

    fn stage() -> (Stage, ManualClock, MemoryLog) {
        let clock = ManualClock::new();
        let log = MemoryLog::new();
        let stage = Stage::new(&RuntimeConfig::default(), Rc::new(clock.clone()), Rc::new(log.clone()));
        (stage, clock, log)
    }

    #[test]
    fn find_by_name_or_id() {
        let (mut stage, _, _) = stage();
        let a = stage.add_sprite("cat", SpriteOptions::default());
        let b = stage.add_sprite("dog", SpriteOptions::default());
        assert_eq!(stage.find("dog"), Some(b));
        assert_eq!(stage.find(&a.to_string()), Some(a));
        assert_eq!(stage.find("bird"), None);
    }

    #[test]
    fn topmost_sprite_wins_hit_test() {
        let (mut stage, _, _) = stage();
        let _below = stage.add_sprite("below", SpriteOptions::default());
        let above = stage.add_sprite("above", SpriteOptions::default());
        assert_eq!(stage.sprite_at(5.0, 5.0), Some(above));
        stage.sprite_mut(above).unwrap().visible = false;
        assert_ne!(stage.sprite_at(5.0, 5.0), Some(above));
    }

    #[test]
    fn dragging_moves_only_draggable_sprites() {
        let (mut stage, _, _) = stage();
        let fixed = stage.add_sprite("fixed", SpriteOptions::default());
        assert_eq!(stage.pointer_down(0.0, 0.0), Some(fixed));
        stage.pointer_move(40.0, 40.0);
        assert_eq!(stage.sprite(fixed).unwrap().x, 0.0);
        assert_eq!(stage.selected(), Some(fixed));

        let options = SpriteOptions {
            x: 100.0,
            draggable: true,
            ..SpriteOptions::default()
        };
        let free = stage.add_sprite("free", options);
        stage.pointer_down(100.0, 0.0);
        stage.pointer_move(120.0, -30.0);
        stage.pointer_up();
        stage.pointer_move(0.0, 0.0);
        let sprite = stage.sprite(free).unwrap();
        assert_eq!((sprite.x, sprite.y), (120.0, -30.0));
    }

    #[test]
    fn canvas_coordinates_are_centred_and_flipped() {
        let (stage, _, _) = stage();
        assert_eq!(stage.to_stage_coords(320.0, 180.0, 640.0, 360.0), (0.0, 0.0));
        assert_eq!(stage.to_stage_coords(0.0, 0.0, 320.0, 180.0), (-320.0, 180.0));
    }

    #[test]
    fn speech_expires_on_stage_clock() {
        let (mut stage, clock, _) = stage();
        let id = stage.add_sprite("cat", SpriteOptions::default());
        stage.say(id, "hi", 500.0);
        clock.advance(499.0);
        stage.update();
        assert_eq!(stage.sprite(id).unwrap().speech(), Some("hi"));
        clock.advance(1.0);
        stage.update();
        assert_eq!(stage.sprite(id).unwrap().speech(), None);
    }

    #[test]
    fn failed_costume_is_logged_and_skipped() {
        let (mut stage, _, log) = stage();
        let id = stage.add_sprite("cat", SpriteOptions::default());
        stage.load_costume(id, "/no/such/costume.png", "missing").unwrap();
        stage.finish_loads();
        assert!(stage.sprite(id).unwrap().costumes().is_empty());
        assert_eq!(log.with_severity(Severity::Warn).len(), 1);
    }

    #[test]
    fn remove_clears_selection() {
        let (mut stage, _, _) = stage();
        let id = stage.add_sprite("cat", SpriteOptions::default());
        stage.select(Some(id));
        assert!(stage.remove_sprite(id));
        assert_eq!(stage.selected(), None);
        assert!(!stage.remove_sprite(id));
    }

    #[test]
    fn reset_and_clear() {
        let (mut stage, _, _) = stage();
        let id = stage.add_sprite("cat", SpriteOptions::default());
        stage.background_color = "#000000".to_string();
        {
            let sprite = stage.sprite_mut(id).unwrap();
            sprite.go_to(10.0, 10.0);
            sprite.turn(45.0);
            sprite.say("hello", 0.0, 0.0);
        }
        stage.reset_sprites();
        let sprite = stage.sprite(id).unwrap();
        assert_eq!((sprite.x, sprite.y, sprite.rotation), (0.0, 0.0, 0.0));
        assert_eq!(sprite.speech(), None);

        stage.clear();
        assert!(stage.sprites().is_empty());
        assert_eq!(stage.background_color, "#ffffff");
    }
}

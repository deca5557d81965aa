use log::trace;

use crate::error::LibraryError;
use crate::render::renderer::{RenderedFrame, StageRenderer};
use crate::sprite::stage::StageHandle;

/// Drives stage updates and rendering once per display frame, independent
/// of the executor tick.
pub struct RenderLoop {
    renderer: StageRenderer,
    frames: u64,
}

impl RenderLoop {
    pub fn new(renderer: StageRenderer) -> Self {
        Self { renderer, frames: 0 }
    }

    /// Applies finished loads, advances glides and speech, then draws.
    pub fn frame(&mut self, stage: &StageHandle) -> Result<RenderedFrame, LibraryError> {
        let frame = {
            let mut stage = stage.borrow_mut();
            stage.update();
            self.renderer.render(&stage)?
        };
        self.frames += 1;
        trace!("Frame {} rendered", self.frames);
        Ok(frame)
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn renderer(&self) -> &StageRenderer {
        &self.renderer
    }
}

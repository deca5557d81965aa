pub mod bubble;
pub mod render_loop;
pub mod renderer;

pub use bubble::{layout_bubble, wrap_words, BubbleLayout, FixedAdvance, TextMeasure};
pub use render_loop::RenderLoop;
pub use renderer::{parse_color, RenderedFrame, StageRenderer, TextAlign, TextRun};

//! Speech bubble layout.

use crate::config::BubbleConfig;

/// Measures rendered text width in pixels.
pub trait TextMeasure {
    fn width(&self, text: &str) -> f64;
}

/// Every character advances by the same amount.
#[derive(Clone, Copy, Debug)]
pub struct FixedAdvance(pub f64);

impl TextMeasure for FixedAdvance {
    fn width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.0
    }
}

/// Where a bubble goes on the canvas, in canvas pixels (y down).
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub lines: Vec<String>,
    /// Triangle pointing from the bubble's bottom edge down to the sprite.
    pub tail: [(f64, f64); 3],
    /// Baseline of the first line.
    pub first_baseline: f64,
    pub line_height: f64,
}

/// Greedy word wrap. A word wider than `max_width` gets a line to itself.
pub fn wrap_words(text: &str, max_width: f64, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", line, word);
            if measure.width(&candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Lays out a bubble centered on `anchor_x` and sitting `config.offset`
/// pixels above `sprite_top`.
pub fn layout_bubble(
    text: &str,
    anchor_x: f64,
    sprite_top: f64,
    config: &BubbleConfig,
    measure: &dyn TextMeasure,
) -> BubbleLayout {
    let lines = wrap_words(text, config.max_width - 2.0 * config.padding, measure);
    let widest = lines.iter().map(|l| measure.width(l)).fold(0.0, f64::max);
    let width = (widest + 2.0 * config.padding).min(config.max_width);
    let line_height = config.font_size + config.line_gap;
    let height = lines.len() as f64 * line_height + 2.0 * config.padding;

    let bottom = sprite_top - config.offset;
    let x = anchor_x - width / 2.0;
    let y = bottom - height;
    let tail_half = (config.offset * 0.5).min(width / 4.0);
    let tail = [
        (anchor_x - tail_half, bottom),
        (anchor_x + tail_half, bottom),
        (anchor_x, bottom + config.offset * 0.7),
    ];

    BubbleLayout {
        x,
        y,
        width,
        height,
        lines,
        tail,
        first_baseline: y + config.padding + config.font_size,
        line_height,
    }
}

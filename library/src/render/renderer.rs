//! Raster renderer for the stage.
//!
//! Stage coordinates have their origin at the center with y pointing up;
//! the canvas has its origin top-left with y pointing down. Text is not
//! rasterized here. It comes back as positioned [`TextRun`]s for whatever
//! text engine the host has.

use std::path::Path;

use image::RgbaImage;
use log::{trace, warn};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::config::{BubbleConfig, RuntimeConfig};
use crate::error::LibraryError;
use crate::render::bubble::{layout_bubble, BubbleLayout, FixedAdvance, TextMeasure};
use crate::sprite::sprite::{Appearance, Sprite};
use crate::sprite::stage::Stage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// A piece of text to draw over the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Anchor in canvas pixels: the baseline start for `Left`, the glyph
    /// center for `Center`.
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Clockwise degrees around the anchor.
    pub rotation: f32,
    pub color: [u8; 4],
    pub align: TextAlign,
}

pub struct RenderedFrame {
    pub pixmap: Pixmap,
    pub text_runs: Vec<TextRun>,
}

impl RenderedFrame {
    /// Straight-alpha copy of the pixels.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, LibraryError> {
        let data: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), data)
            .ok_or_else(|| LibraryError::render("pixel buffer does not match frame size"))
    }

    pub fn save_png(&self, path: &Path) -> Result<(), LibraryError> {
        self.to_rgba_image()?.save(path)?;
        Ok(())
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(text: &str) -> Option<Color> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 => {
            let nibble = |i: usize| byte(&hex[i..i + 1]).map(|v| v * 17);
            (nibble(0)?, nibble(1)?, nibble(2)?, 255)
        }
        6 => (byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255),
        8 => (byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, byte(&hex[6..8])?),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, a))
}

const BUBBLE_FILL: [u8; 4] = [255, 255, 255, 255];
const BUBBLE_STROKE: [u8; 4] = [51, 51, 51, 255];
const TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];
const FALLBACK_FILL: [u8; 4] = [76, 151, 255, 255];
const LOADING_FILL: [u8; 4] = [200, 200, 200, 255];

pub struct StageRenderer {
    width: u32,
    height: u32,
    bubble: BubbleConfig,
    measure: Box<dyn TextMeasure>,
}

impl StageRenderer {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            width: config.stage.width,
            height: config.stage.height,
            bubble: config.bubble.clone(),
            measure: Box::new(FixedAdvance(config.bubble.char_width)),
        }
    }

    /// Replaces the text measure used for bubble wrapping.
    pub fn with_measure(mut self, measure: Box<dyn TextMeasure>) -> Self {
        self.measure = measure;
        self
    }

    /// Stage point to canvas pixel.
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.width as f64 / 2.0, self.height as f64 / 2.0 - y)
    }

    pub fn render(&self, stage: &Stage) -> Result<RenderedFrame, LibraryError> {
        let mut pixmap = Pixmap::new(self.width, self.height)
            .ok_or_else(|| LibraryError::render(format!("cannot allocate {}x{} frame", self.width, self.height)))?;
        let mut text_runs = Vec::new();

        let background = parse_color(&stage.background_color).unwrap_or_else(|| {
            warn!("Invalid background color '{}', using white", stage.background_color);
            Color::WHITE
        });
        pixmap.fill(background);

        if let Some(image) = stage.background_image() {
            let src: &Pixmap = &image.pixmap;
            let transform = Transform::from_scale(
                self.width as f32 / src.width() as f32,
                self.height as f32 / src.height() as f32,
            );
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
        }

        for sprite in stage.sprites().iter().filter(|s| s.visible) {
            self.draw_sprite(&mut pixmap, sprite, &mut text_runs);
        }
        for sprite in stage.sprites().iter().filter(|s| s.visible) {
            if let Some(text) = sprite.speech() {
                let (cx, cy) = self.to_canvas(sprite.x, sprite.y);
                let (_, h) = sprite.display_size();
                let layout = layout_bubble(text, cx, cy - h.abs() / 2.0, &self.bubble, self.measure.as_ref());
                self.draw_bubble(&mut pixmap, &layout, &mut text_runs);
            }
        }

        trace!(
            "Rendered {} sprite(s), {} text run(s)",
            stage.sprites().len(),
            text_runs.len()
        );
        Ok(RenderedFrame { pixmap, text_runs })
    }

    fn draw_sprite(&self, pixmap: &mut Pixmap, sprite: &Sprite, text_runs: &mut Vec<TextRun>) {
        let (cx, cy) = self.to_canvas(sprite.x, sprite.y);
        let placed = Transform::from_translate(cx as f32, cy as f32).pre_rotate(sprite.rotation as f32);
        let opacity = sprite.opacity.clamp(0.0, 1.0) as f32;

        match sprite.appearance() {
            Appearance::Costume(costume) => {
                let src: &Pixmap = &costume.pixmap;
                let (ow, oh) = (src.width() as f32, src.height() as f32);
                let sx = (costume.width * sprite.scale_x) as f32 / ow;
                let sy = (costume.height * sprite.scale_y) as f32 / oh;
                let transform = placed.pre_scale(sx, sy).pre_translate(-ow / 2.0, -oh / 2.0);
                let paint = PixmapPaint {
                    opacity,
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
            }
            Appearance::Fallback { glyph, loading } => {
                let (w, h) = sprite.display_size();
                let (w, h) = (w.abs() as f32, h.abs() as f32);
                if let Some(rect) = Rect::from_xywh(-w / 2.0, -h / 2.0, w, h) {
                    let fill = if loading { LOADING_FILL } else { FALLBACK_FILL };
                    let paint = solid_paint(fill, opacity * 0.35);
                    pixmap.fill_rect(rect, &paint, placed, None);
                }
                text_runs.push(TextRun {
                    text: glyph.to_string(),
                    x: cx as f32,
                    y: cy as f32,
                    size: h * 0.8,
                    rotation: sprite.rotation as f32,
                    color: with_alpha(TEXT_COLOR, opacity),
                    align: TextAlign::Center,
                });
            }
        }
    }

    fn draw_bubble(&self, pixmap: &mut Pixmap, layout: &BubbleLayout, text_runs: &mut Vec<TextRun>) {
        let radius = (self.bubble.padding as f32).min(layout.height as f32 / 2.0);
        let body = rounded_rect(
            layout.x as f32,
            layout.y as f32,
            layout.width as f32,
            layout.height as f32,
            radius,
        );
        let mut tail = PathBuilder::new();
        let [a, b, tip] = layout.tail;
        tail.move_to(a.0 as f32, a.1 as f32);
        tail.line_to(tip.0 as f32, tip.1 as f32);
        tail.line_to(b.0 as f32, b.1 as f32);
        tail.close();

        let fill = solid_paint(BUBBLE_FILL, 1.0);
        let outline = solid_paint(BUBBLE_STROKE, 1.0);
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        let identity = Transform::identity();
        if let Some(path) = tail.finish() {
            pixmap.fill_path(&path, &fill, FillRule::Winding, identity, None);
            pixmap.stroke_path(&path, &outline, &stroke, identity, None);
        }
        if let Some(path) = body {
            pixmap.fill_path(&path, &fill, FillRule::Winding, identity, None);
            pixmap.stroke_path(&path, &outline, &stroke, identity, None);
        }

        for (i, line) in layout.lines.iter().enumerate() {
            text_runs.push(TextRun {
                text: line.clone(),
                x: (layout.x + self.bubble.padding) as f32,
                y: (layout.first_baseline + i as f64 * layout.line_height) as f32,
                size: self.bubble.font_size as f32,
                rotation: 0.0,
                color: TEXT_COLOR,
                align: TextAlign::Left,
            });
        }
    }
}

fn solid_paint(rgba: [u8; 4], opacity: f32) -> Paint<'static> {
    let [r, g, b, a] = with_alpha(rgba, opacity);
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn with_alpha(rgba: [u8; 4], opacity: f32) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    [r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8]
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#ffffff"), Some(Color::WHITE));
        assert_eq!(parse_color("#000"), Some(Color::BLACK));
        assert_eq!(parse_color("#ff000080").map(|c| c.to_color_u8().alpha()), Some(128));
        assert_eq!(parse_color("white"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn stage_origin_is_canvas_center() {
        let renderer = StageRenderer::new(&RuntimeConfig::default());
        let config = RuntimeConfig::default();
        let (w, h) = (config.stage.width as f64, config.stage.height as f64);
        assert_eq!(renderer.to_canvas(0.0, 0.0), (w / 2.0, h / 2.0));
        assert_eq!(renderer.to_canvas(10.0, 10.0), (w / 2.0 + 10.0, h / 2.0 - 10.0));
    }
}

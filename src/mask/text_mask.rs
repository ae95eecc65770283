#![allow(clippy::cast_precision_loss)]

use image::Rgba;

use crate::render::{
    canvas::{AlphaBuffer, Canvas},
    font::{FontSpec, TextBackend},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TextMaskOptions {
    pub font_weight: String,
    pub font_size: f32,
    pub font_family: String,
    pub width: u32,
    pub height: u32,
    pub line_height: f32,
}

/// Greedy word wrap: a line breaks before the word that would push it past
/// `max_width`. The first word always stays on the first line.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for (n, word) in text.split(' ').enumerate() {
        let candidate = format!("{line}{word} ");
        if measure(&candidate) > max_width && n > 0 {
            lines.push(line.trim().to_string());
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line.trim().to_string());
    }
    lines
}

/// Renders `text` centered on a `width`×`height` surface and inverts it: the
/// result is opaque white everywhere except where the text was drawn.
pub fn create_text_mask(text: &str, options: &TextMaskOptions, backend: &dyn TextBackend) -> Canvas {
    let font = FontSpec {
        family: &options.font_family,
        weight: &options.font_weight,
        size: options.font_size,
    };
    let (width, height) = (options.width, options.height);
    let lines = wrap_text(text, width as f32, |s| backend.measure_width(s, &font));

    let mut ink = AlphaBuffer::new(width, height);
    let center_x = width as f32 / 2.0;
    let mut y = height as f32 / 2.0 - (lines.len().saturating_sub(1)) as f32 * options.line_height / 2.0;
    for line in &lines {
        let line_width = backend.measure_width(line, &font);
        backend.fill_text(&mut ink, line, center_x - line_width / 2.0, y, &font);
        y += options.line_height;
    }

    let mut mask = Canvas::new(width, height);
    for py in 0..height {
        for px in 0..width {
            let alpha = 255 - ink.get(px, py);
            mask.put_pixel(px, py, Rgba([255, 255, 255, alpha]));
        }
    }
    mask
}

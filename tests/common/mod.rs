#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(dead_code)]

use image::Rgba;
use word_cloud::{
    app::{
        options::CloudOptions,
        targets::{Target, TargetSet},
    },
    domain::word::WordItem,
    render::{
        canvas::{AlphaBuffer, Canvas},
        color::WordColor,
        elements::ElementContainer,
        font::{FontSpec, TextBackend},
    },
};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Monospace backend that inks every character's full em box, so glyph
/// footprints are plain rectangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidBackend;

impl TextBackend for SolidBackend {
    fn measure_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        text.chars().count() as f32 * font.size
    }

    fn fill_text(&self, target: &mut AlphaBuffer, text: &str, x: f32, y: f32, font: &FontSpec<'_>) {
        let width = self.measure_width(text, font);
        let top = y - font.size / 2.0;
        for py in top.round() as i64..(top + font.size).round() as i64 {
            for px in x.round() as i64..(x + width).round() as i64 {
                target.set(px, py, 255);
            }
        }
    }
}

pub fn fixed_color_options() -> CloudOptions {
    CloudOptions {
        color: WordColor::Fixed("#1a1a1a".to_string()),
        ..CloudOptions::default()
    }
}

pub fn canvas_targets(width: u32, height: u32) -> TargetSet {
    TargetSet::new([Target::Canvas(Canvas::new(width, height))]).expect("canvas target")
}

pub fn both_targets(width: u32, height: u32) -> TargetSet {
    TargetSet::new([
        Target::Canvas(Canvas::new(width, height)),
        Target::Container(ElementContainer::new(width, height)),
    ])
    .expect("targets")
}

pub fn alpha_beta() -> Vec<WordItem> {
    vec![WordItem::new("alpha", 10.0), WordItem::new("beta", 10.0)]
}

pub fn painted_pixels(canvas: &Canvas, background: Rgba<u8>) -> usize {
    canvas.image().pixels().filter(|p| **p != background).count()
}

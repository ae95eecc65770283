#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use font8x8::{
    BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS, MISC_FONTS,
    UnicodeFonts,
};

use crate::render::canvas::AlphaBuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub weight: &'a str,
    pub size: f32,
}

impl FontSpec<'_> {
    /// CSS shorthand, e.g. `bold 24px sans-serif`.
    pub fn css(&self) -> String {
        format!("{} {}px {}", self.weight, self.size, self.family)
    }

    pub fn is_bold(&self) -> bool {
        match self.weight.trim() {
            "bold" | "bolder" => true,
            other => other.parse::<u16>().is_ok_and(|w| w >= 600),
        }
    }
}

/// Rendering seam used for glyph measurement, text masks and canvas output.
pub trait TextBackend: Send {
    /// False when the backend cannot rasterize text at all; the cloud then stays inert.
    fn is_supported(&self) -> bool {
        true
    }

    fn measure_width(&self, text: &str, font: &FontSpec<'_>) -> f32;

    /// Rasterizes `text` with its left edge at `x` and its vertical middle at `y`.
    fn fill_text(&self, target: &mut AlphaBuffer, text: &str, x: f32, y: f32, font: &FontSpec<'_>);
}

/// Monospace 8×8 bitmap font scaled to the requested pixel size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    fn glyph(ch: char) -> [u8; 8] {
        BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| GREEK_FONTS.get(ch))
            .or_else(|| MISC_FONTS.get(ch))
            .or_else(|| BOX_FONTS.get(ch))
            .or_else(|| BLOCK_FONTS.get(ch))
            .or_else(|| HIRAGANA_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }
}

impl TextBackend for BitmapFont {
    fn measure_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        text.chars().count() as f32 * font.size
    }

    fn fill_text(&self, target: &mut AlphaBuffer, text: &str, x: f32, y: f32, font: &FontSpec<'_>) {
        let size = font.size;
        if size <= 0.0 {
            return;
        }
        let scale = size / 8.0;
        let top = y - size / 2.0;
        let smear = if font.is_bold() {
            (size / 16.0).ceil().max(1.0) as i64
        } else {
            0
        };

        for (i, ch) in text.chars().enumerate() {
            let rows = Self::glyph(ch);
            let left = x + i as f32 * size;
            let px_start = left.floor() as i64;
            let px_end = (left + size).ceil() as i64;
            let py_start = top.floor() as i64;
            let py_end = (top + size).ceil() as i64;

            for py in py_start..py_end {
                let sy = ((py as f32 + 0.5 - top) / scale).floor();
                if !(0.0..8.0).contains(&sy) {
                    continue;
                }
                let row = rows[sy as usize];
                for px in px_start..px_end {
                    let sx = ((px as f32 + 0.5 - left) / scale).floor();
                    if !(0.0..8.0).contains(&sx) {
                        continue;
                    }
                    if (row >> (sx as u32)) & 1 == 1 {
                        for dx in 0..=smear {
                            target.set(px + dx, py, 255);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f32) -> FontSpec<'static> {
        FontSpec {
            family: "monospace",
            weight: "normal",
            size,
        }
    }

    #[test]
    fn width_scales_with_size_and_length() {
        assert!((BitmapFont.measure_width("abc", &font(10.0)) - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fill_text_stays_inside_em_box() {
        let mut buffer = AlphaBuffer::new(64, 64);
        BitmapFont.fill_text(&mut buffer, "W", 16.0, 32.0, &font(16.0));
        let mut painted = 0;
        for y in 0..64 {
            for x in 0..64 {
                if buffer.get(x, y) > 0 {
                    painted += 1;
                    assert!((16..32).contains(&x), "x={x}");
                    assert!((24..40).contains(&y), "y={y}");
                }
            }
        }
        assert!(painted > 0);
    }

    #[test]
    fn space_paints_nothing() {
        let mut buffer = AlphaBuffer::new(32, 32);
        BitmapFont.fill_text(&mut buffer, " ", 0.0, 16.0, &font(16.0));
        assert!(!buffer.any_in_block(0, 0, 32));
    }

    #[test]
    fn numeric_weights_count_as_bold() {
        let spec = FontSpec {
            weight: "700",
            ..font(12.0)
        };
        assert!(spec.is_bold());
        assert!(!font(12.0).is_bold());
    }
}

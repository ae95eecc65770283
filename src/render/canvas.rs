#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

/// RGBA raster surface the cloud paints on and reads back from in preserve mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Reallocates the surface; contents are lost, like resizing a canvas element.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    /// Pixel lookup that treats everything outside the surface as transparent.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        self.image
            .get_pixel_checked(x, y)
            .copied()
            .unwrap_or(Rgba([0, 0, 0, 0]))
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.width() && y < self.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    /// Clears then fills the whole surface with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// Source-over fill of a fractional rectangle; edge pixels are blended by
    /// their covered area.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let x0 = x.floor().max(0.0) as u32;
        let y0 = y.floor().max(0.0) as u32;
        let x1 = ((x + w).ceil().max(0.0) as u32).min(self.width());
        let y1 = ((y + h).ceil().max(0.0) as u32).min(self.height());

        for py in y0..y1 {
            let cover_y = overlap(py as f32, y, y + h);
            for px in x0..x1 {
                let coverage = cover_y * overlap(px as f32, x, x + w);
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    /// Paints `color` through an alpha coverage buffer whose top-left lands at
    /// (`left`, `top`) in surface pixels.
    pub fn fill_coverage(&mut self, coverage: &AlphaBuffer, left: i64, top: i64, color: Rgba<u8>) {
        for by in 0..coverage.height() {
            let sy = top + i64::from(by);
            if sy < 0 || sy >= i64::from(self.height()) {
                continue;
            }
            for bx in 0..coverage.width() {
                let sx = left + i64::from(bx);
                if sx < 0 || sx >= i64::from(self.width()) {
                    continue;
                }
                let alpha = coverage.get(bx, by);
                if alpha > 0 {
                    self.blend(sx as u32, sy as u32, color, f32::from(alpha) / 255.0);
                }
            }
        }
    }

    /// Source-over composite of another canvas at the origin.
    pub fn draw_canvas(&mut self, other: &Canvas) {
        let w = self.width().min(other.width());
        let h = self.height().min(other.height());
        for y in 0..h {
            for x in 0..w {
                let src = other.pixel(x, y);
                if src[3] == 255 {
                    self.image.put_pixel(x, y, src);
                } else if src[3] > 0 {
                    self.blend(x, y, Rgba([src[0], src[1], src[2], 255]), f32::from(src[3]) / 255.0);
                }
            }
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba<u8>, coverage: f32) {
        let dst = *self.image.get_pixel(x, y);
        let sa = f32::from(color[3]) / 255.0 * coverage.clamp(0.0, 1.0);
        let da = f32::from(dst[3]) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            self.image.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            return;
        }
        let mut out = [0u8; 4];
        for c in 0..3 {
            let sc = f32::from(color[c]);
            let dc = f32::from(dst[c]);
            out[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
        }
        out[3] = (out_a * 255.0).round() as u8;
        self.image.put_pixel(x, y, Rgba(out));
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("writing canvas to {} failed", path.display()))
    }
}

fn overlap(pixel: f32, start: f32, end: f32) -> f32 {
    (end.min(pixel + 1.0) - start.max(pixel)).clamp(0.0, 1.0)
}

/// Single-channel coverage buffer used for off-screen glyph rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlphaBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaBuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut buffer = Self::default();
        buffer.reset(width, height);
        buffer
    }

    /// Resizes and zeroes the buffer, keeping the allocation.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize, 0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: i64, y: i64, alpha: u8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = self.data[idx].max(alpha);
    }

    /// True when any pixel inside the `size`×`size` block at (`x0`, `y0`) is painted.
    pub fn any_in_block(&self, x0: u32, y0: u32, size: u32) -> bool {
        if x0 >= self.width {
            return false;
        }
        let y_end = (y0 + size).min(self.height);
        let x_end = (x0 + size).min(self.width);
        (y0..y_end).any(|y| {
            let row = y as usize * self.width as usize;
            self.data[row + x0 as usize..row + x_end as usize]
                .iter()
                .any(|&a| a != 0)
        })
    }
}

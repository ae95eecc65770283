#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use tracing::trace;

use crate::{
    app::options::CloudOptions,
    engine::budget::TimeBudget,
    render::{
        canvas::AlphaBuffer,
        font::{FontSpec, TextBackend},
    },
};

/// Tight box around a glyph's occupied cells, inclusive, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl GridBounds {
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphInfo {
    pub font_size: f32,
    pub text_width: f32,
    pub text_height: f32,
    /// Probe box extent in cells.
    pub grid_width: i32,
    pub grid_height: i32,
    pub occupied_x: Vec<i32>,
    pub occupied_y: Vec<i32>,
    pub bounds: GridBounds,
    pub fill_text_offset_x: f32,
    pub fill_text_offset_y: f32,
}

impl GlyphInfo {
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.occupied_x
            .iter()
            .copied()
            .zip(self.occupied_y.iter().copied())
    }

    pub fn occupied_len(&self) -> usize {
        self.occupied_x.len()
    }
}

/// Largest probe surface side, in pixels, the measurer will render into.
pub const MAX_PROBE_SIDE: u32 = 8192;

/// Resolved font and text metrics of a word, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TextExtent {
    pub font_size: f32,
    pub font_weight: String,
    pub text_width: f32,
    pub text_height: f32,
}

impl TextExtent {
    /// True when the text cannot fit a grid of `grid` cells of `cell` pixels,
    /// allowing one cell of side bearing on each side.
    pub fn exceeds(&self, grid: (usize, usize), cell: u32) -> bool {
        let span = |cells: usize| (cells as f64 + 2.0) * f64::from(cell);
        f64::from(self.text_width) > span(grid.0) || f64::from(self.font_size) > span(grid.1)
    }
}

/// Probe surface size in pixels, a whole number of cells around the text with
/// a text-height margin. `None` past [`MAX_PROBE_SIDE`] or for non-finite metrics.
fn probe_box(text_width: f32, text_height: f32, cell: u32) -> Option<(u32, u32)> {
    if !(text_width.is_finite() && text_height.is_finite()) {
        return None;
    }
    let g = f64::from(cell);
    let whole_cells = |extent: f64| (extent / g).ceil().max(1.0) * g;
    let width = whole_cells(f64::from(text_width) + f64::from(text_height) * 2.0);
    let height = whole_cells(f64::from(text_height) * 3.0);
    let limit = f64::from(MAX_PROBE_SIDE);
    (width <= limit && height <= limit).then_some((width as u32, height as u32))
}

pub struct GlyphMeasurer {
    backend: Box<dyn TextBackend>,
    cell_size: u32,
    scratch: AlphaBuffer,
}

impl GlyphMeasurer {
    #[must_use]
    pub fn new(backend: Box<dyn TextBackend>, cell_size: u32) -> Self {
        Self {
            backend,
            cell_size,
            scratch: AlphaBuffer::default(),
        }
    }

    pub fn backend(&self) -> &dyn TextBackend {
        self.backend.as_ref()
    }

    pub fn set_cell_size(&mut self, cell_size: u32) {
        self.cell_size = cell_size;
    }

    /// Coverage left behind by the most recent [`measure`](Self::measure) call.
    pub fn last_render(&self) -> &AlphaBuffer {
        &self.scratch
    }

    /// Resolves the font size for `weight`; `None` when the word is too small to draw.
    pub fn font_size(options: &CloudOptions, weight: f32) -> Option<f32> {
        let size = options.weight_scale.font_size(weight);
        (size.is_finite() && size > options.min_size).then_some(size)
    }

    /// Font and text metrics for `word` without rendering it; `None` when the
    /// word is too small to draw.
    pub fn estimate(&self, word: &str, weight: f32, options: &CloudOptions) -> Option<TextExtent> {
        let font_size = Self::font_size(options, weight)?;
        let font_weight = options.font_weight.resolve(word, weight, font_size);
        let font = FontSpec {
            family: &options.font_family,
            weight: &font_weight,
            size: font_size,
        };
        let text_width = self.backend.measure_width(word, &font);
        let text_height = font_size
            .max(self.backend.measure_width("m", &font))
            .max(self.backend.measure_width("\u{FF37}", &font));
        Some(TextExtent {
            font_size,
            font_weight,
            text_width,
            text_height,
        })
    }

    pub fn measure(
        &mut self,
        word: &str,
        weight: f32,
        options: &CloudOptions,
        budget: &TimeBudget,
    ) -> Option<GlyphInfo> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let info = self.measure_into(&mut scratch, word, weight, options, budget);
        self.scratch = scratch;
        info
    }

    /// Same as [`measure`](Self::measure) but renders into a fresh buffer that is
    /// handed back for inspection.
    pub fn measure_inspect(
        &self,
        word: &str,
        weight: f32,
        options: &CloudOptions,
        budget: &TimeBudget,
    ) -> (Option<GlyphInfo>, AlphaBuffer) {
        let mut fresh = AlphaBuffer::default();
        let info = self.measure_into(&mut fresh, word, weight, options, budget);
        (info, fresh)
    }

    fn measure_into(
        &self,
        scratch: &mut AlphaBuffer,
        word: &str,
        weight: f32,
        options: &CloudOptions,
        budget: &TimeBudget,
    ) -> Option<GlyphInfo> {
        let TextExtent {
            font_size,
            font_weight,
            text_width,
            text_height,
        } = self.estimate(word, weight, options)?;
        let font = FontSpec {
            family: &options.font_family,
            weight: &font_weight,
            size: font_size,
        };

        let g = self.cell_size;
        let Some((width, height)) = probe_box(text_width, text_height, g) else {
            trace!(word, font_size, "probe box too large to render");
            return None;
        };
        let grid_width = width / g;
        let grid_height = height / g;

        let fill_text_offset_x = -text_width / 2.0;
        let fill_text_offset_y = -text_height / 2.0;

        scratch.reset(width, height);
        self.backend.fill_text(
            scratch,
            word,
            width as f32 / 2.0 + fill_text_offset_x,
            height as f32 / 2.0,
            &font,
        );

        if budget.exceeded() {
            return None;
        }

        let mut occupied_x = Vec::new();
        let mut occupied_y = Vec::new();
        let mut bounds: Option<GridBounds> = None;
        for gx in 0..grid_width {
            for gy in 0..grid_height {
                if !scratch.any_in_block(gx * g, gy * g, g) {
                    continue;
                }
                let (x, y) = (gx as i32, gy as i32);
                occupied_x.push(x);
                occupied_y.push(y);
                bounds = Some(match bounds {
                    None => GridBounds {
                        top: y,
                        right: x,
                        bottom: y,
                        left: x,
                    },
                    Some(b) => GridBounds {
                        top: b.top.min(y),
                        right: b.right.max(x),
                        bottom: b.bottom.max(y),
                        left: b.left.min(x),
                    },
                });
            }
        }

        let (cx, cy) = ((grid_width / 2) as i32, (grid_height / 2) as i32);
        let bounds = bounds.unwrap_or(GridBounds {
            top: cy,
            right: cx,
            bottom: cy,
            left: cx,
        });

        trace!(
            word,
            font_size,
            cells = occupied_x.len(),
            grid_width,
            grid_height,
            "measured glyph"
        );

        Some(GlyphInfo {
            font_size,
            text_width,
            text_height,
            grid_width: grid_width as i32,
            grid_height: grid_height as i32,
            occupied_x,
            occupied_y,
            bounds,
            fill_text_offset_x,
            fill_text_offset_y,
        })
    }
}

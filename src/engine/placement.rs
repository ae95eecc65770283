#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use image::Rgba;
use tracing::{debug, trace, warn};

use crate::{
    app::{options::CloudOptions, targets::TargetSet},
    domain::word::WordItem,
    engine::{
        budget::TimeBudget,
        grid::OccupancyGrid,
        measure::{GlyphInfo, GlyphMeasurer},
        radial::RadialSearch,
        seed::seed_grid,
    },
    render::{
        color::{ColorContext, parse_css_color},
        elements::StyledElement,
        font::{FontSpec, TextBackend},
    },
};

/// Upper bound on shrink-to-fit retries for a single word.
pub const MAX_SHRINK_STEPS: usize = 64;
const SHRINK_FACTOR: f32 = 3.0 / 4.0;
const FALLBACK_INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Where and how a word was committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Grid cell of the glyph probe box's top-left corner.
    pub anchor: (i64, i64),
    pub radius: usize,
    pub theta: f64,
    pub font_size: f32,
    pub color: String,
    pub cells: Vec<(usize, usize)>,
    /// Shrink retries it took before the word fit.
    pub shrinks: usize,
}

/// Measures, searches and commits words onto a run's grid and targets.
pub struct PlacementEngine {
    measurer: GlyphMeasurer,
    options: CloudOptions,
    grid: OccupancyGrid,
    search: RadialSearch,
    mask_ink: Rgba<u8>,
}

impl PlacementEngine {
    #[must_use]
    pub fn new(backend: Box<dyn TextBackend>, options: CloudOptions) -> Self {
        let measurer = GlyphMeasurer::new(backend, options.grid_size);
        let search = RadialSearch::new((0.0, 0.0), options.shape.clone(), options.ellipticity, (0, 0));
        let mask_ink = parse_css_color(&options.mask_color).unwrap_or(FALLBACK_INK);
        Self {
            measurer,
            options,
            grid: OccupancyGrid::new_free(0, 0),
            search,
            mask_ink,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.measurer.backend().is_supported()
    }

    pub fn options(&self) -> &CloudOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CloudOptions) {
        self.measurer.set_cell_size(options.grid_size);
        self.mask_ink = parse_css_color(&options.mask_color).unwrap_or(FALLBACK_INK);
        self.options = options;
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn search(&self) -> &RadialSearch {
        &self.search
    }

    pub fn backend(&self) -> &dyn TextBackend {
        self.measurer.backend()
    }

    /// Sizes the grid to the primary surface, picks the center, drops cached
    /// rings and seeds occupancy from the targets.
    pub fn prepare(&mut self, targets: &mut TargetSet) {
        let g = self.options.grid_size;
        let (width, height) = targets.surface_size();
        let dims = OccupancyGrid::dimensions_for(width, height, g);
        let center = match self.options.origin {
            Some((x, y)) => (f64::from(x) / f64::from(g), f64::from(y) / f64::from(g)),
            None => (dims.0 as f64 / 2.0, dims.1 as f64 / 2.0),
        };
        self.search = RadialSearch::new(center, self.options.shape.clone(), self.options.ellipticity, dims);

        let background = parse_css_color(&self.options.background_color).unwrap_or(Rgba([255; 4]));
        self.grid = seed_grid(
            self.options.seed,
            dims,
            g,
            background,
            targets.canvas.as_mut(),
            targets.container.as_mut(),
        );
        debug!(
            grid_width = dims.0,
            grid_height = dims.1,
            center_x = center.0,
            center_y = center.1,
            max_radius = self.search.max_radius(),
            "prepared placement grid"
        );
    }

    /// Places `item`, shrinking its weight in place while shrink-to-fit allows.
    /// `None` means the word was not drawn.
    pub fn put_word(
        &mut self,
        item: &mut WordItem,
        targets: &mut TargetSet,
        budget: &TimeBudget,
    ) -> Option<Placement> {
        let mut shrinks = 0;
        let grid = (self.grid.width(), self.grid.height());
        loop {
            let extent = self
                .measurer
                .estimate(&item.text, item.weight, &self.options)?;
            if !self.options.draw_out_of_bound && extent.exceeds(grid, self.options.grid_size) {
                trace!(word = %item.text, font_size = extent.font_size, "text larger than the grid");
                if !self.shrink(item, &mut shrinks) {
                    return None;
                }
                continue;
            }

            let glyph = self
                .measurer
                .measure(&item.text, item.weight, &self.options, budget)?;
            if budget.exceeded() {
                return None;
            }
            if !self.options.draw_out_of_bound
                && !self.options.shrink_to_fit
                && (glyph.bounds.width() as usize > self.grid.width()
                    || glyph.bounds.height() as usize > self.grid.height())
            {
                trace!(word = %item.text, "glyph larger than the grid");
                return None;
            }

            if let Some(mut placement) = self.search_and_commit(item, &glyph, targets) {
                placement.shrinks = shrinks;
                return Some(placement);
            }

            if !self.shrink(item, &mut shrinks) {
                return None;
            }
        }
    }

    /// Scales the word down for another attempt; false once shrink-to-fit is
    /// off or its retries are spent.
    fn shrink(&self, item: &mut WordItem, shrinks: &mut usize) -> bool {
        if !self.options.shrink_to_fit || *shrinks >= MAX_SHRINK_STEPS {
            return false;
        }
        *shrinks += 1;
        item.weight *= SHRINK_FACTOR;
        trace!(word = %item.text, weight = item.weight, "shrinking to fit");
        true
    }

    fn search_and_commit(
        &mut self,
        item: &WordItem,
        glyph: &GlyphInfo,
        targets: &mut TargetSet,
    ) -> Option<Placement> {
        let allow_oob = self.options.draw_out_of_bound;
        let half_w = f64::from(glyph.grid_width) / 2.0;
        let half_h = f64::from(glyph.grid_height) / 2.0;

        for radius in 0..=self.search.max_radius() {
            let hit = self.search.points_at(radius).iter().find_map(|point| {
                let gx = (point.x - half_w).floor() as i64;
                let gy = (point.y - half_h).floor() as i64;
                self.grid
                    .can_fit(gx, gy, glyph, allow_oob)
                    .then_some((gx, gy, point.theta))
            });
            if let Some((gx, gy, theta)) = hit {
                return Some(self.commit(item, glyph, (gx, gy), radius, theta, targets));
            }
        }
        None
    }

    fn commit(
        &mut self,
        item: &WordItem,
        glyph: &GlyphInfo,
        anchor: (i64, i64),
        radius: usize,
        theta: f64,
        targets: &mut TargetSet,
    ) -> Placement {
        let g = self.options.grid_size;
        let color = self.options.color.resolve(&ColorContext {
            word: &item.text,
            weight: item.weight,
            font_size: glyph.font_size,
            distance: radius,
            theta,
        });
        let font_weight = self
            .options
            .font_weight
            .resolve(&item.text, item.weight, glyph.font_size);

        let (gx, gy) = anchor;
        if let Some(canvas) = targets.canvas.as_mut() {
            let ink = parse_css_color(&color).unwrap_or_else(|err| {
                warn!(word = %item.text, %err, "color function returned an unusable color");
                FALLBACK_INK
            });
            canvas.fill_coverage(
                self.measurer.last_render(),
                gx * i64::from(g),
                gy * i64::from(g),
                ink,
            );
        }

        if let Some(container) = targets.container.as_mut() {
            let mut shell = (self.options.create_element)(item);
            for (key, value) in &item.attributes {
                shell
                    .attributes
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
            let size = glyph.font_size;
            let cell = g as f32;
            container.append(StyledElement {
                shell,
                text: item.text.clone(),
                font: FontSpec {
                    family: &self.options.font_family,
                    weight: &font_weight,
                    size: size.max(12.0),
                }
                .css(),
                left: (gx as f32 + glyph.grid_width as f32 / 2.0) * cell + glyph.fill_text_offset_x,
                top: (gy as f32 + glyph.grid_height as f32 / 2.0) * cell + glyph.fill_text_offset_y,
                width: glyph.text_width,
                height: glyph.text_height,
                line_height: size.max(12.0),
                scale: (size < 12.0).then_some(size / 12.0),
                color: Some(color.clone()),
            });
        }

        let cells = self.grid.mark_filled(gx, gy, glyph);
        if self.options.draw_mask
            && let Some(canvas) = targets.canvas.as_mut()
        {
            let side = g as f32 - self.options.mask_gap_width;
            for &(x, y) in &cells {
                canvas.fill_rect((x as u32 * g) as f32, (y as u32 * g) as f32, side, side, self.mask_ink);
            }
        }

        trace!(word = %item.text, gx, gy, radius, "committed word");
        Placement {
            anchor,
            radius,
            theta,
            font_size: glyph.font_size,
            color,
            cells,
            shrinks: 0,
        }
    }
}

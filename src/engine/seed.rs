#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use image::Rgba;
use tracing::debug;

use crate::{
    app::options::GridSeed,
    engine::grid::OccupancyGrid,
    render::{canvas::Canvas, elements::ElementContainer},
};

/// Reference background pixel, read back from a 1×1 swatch painted with `color`.
pub fn background_swatch(color: Rgba<u8>) -> Rgba<u8> {
    let mut swatch = Canvas::new(1, 1);
    swatch.fill_rect(0.0, 0.0, 1.0, 1.0, color);
    swatch.pixel(0, 0)
}

/// Builds the run's starting grid.
///
/// Clear mode paints every canvas with the background, empties the element
/// container and starts with every cell free. Preserve mode needs a canvas and
/// marks a cell filled as soon as one of its pixels differs from the
/// background swatch; without a canvas it falls back to clearing.
pub fn seed_grid(
    mode: GridSeed,
    grid_size: (usize, usize),
    cell_size: u32,
    background: Rgba<u8>,
    canvas: Option<&mut Canvas>,
    container: Option<&mut ElementContainer>,
) -> OccupancyGrid {
    let (width, height) = grid_size;
    match (mode, canvas) {
        (GridSeed::Preserve, Some(canvas)) => {
            let grid = sample_canvas(canvas, width, height, cell_size, background_swatch(background));
            debug!(
                free = grid.free_count(),
                total = width * height,
                "seeded grid from existing canvas"
            );
            grid
        }
        (_, canvas) => {
            if let Some(canvas) = canvas {
                canvas.fill(background);
            }
            if let Some(container) = container {
                container.clear();
            }
            OccupancyGrid::new_free(width, height)
        }
    }
}

fn sample_canvas(
    canvas: &Canvas,
    width: usize,
    height: usize,
    cell: u32,
    background: Rgba<u8>,
) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new_free(width, height);
    for gy in 0..height {
        for gx in 0..width {
            let (x0, y0) = (gx as u32 * cell, gy as u32 * cell);
            let x1 = (x0 + cell).min(canvas.width());
            let y1 = (y0 + cell).min(canvas.height());
            let painted =
                (y0..y1).any(|y| (x0..x1).any(|x| canvas.pixel(x, y) != background));
            if painted {
                grid.set_filled(gx as i64, gy as i64);
            }
        }
    }
    grid
}

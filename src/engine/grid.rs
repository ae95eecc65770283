#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]

use crate::engine::measure::GlyphInfo;

/// Cell-level occupancy over the target surface; `true` marks a free cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    free: Vec<bool>,
}

impl OccupancyGrid {
    #[must_use]
    pub fn new_free(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            free: vec![true; width * height],
        }
    }

    /// Grid extent covering a `surface_width`×`surface_height` pixel surface.
    pub fn dimensions_for(surface_width: u32, surface_height: u32, cell_size: u32) -> (usize, usize) {
        let cell = cell_size.max(1);
        (
            surface_width.div_ceil(cell) as usize,
            surface_height.div_ceil(cell) as usize,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// `None` outside the grid.
    pub fn is_free(&self, x: i64, y: i64) -> Option<bool> {
        self.index(x, y).map(|i| self.free[i])
    }

    pub fn set_filled(&mut self, x: i64, y: i64) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.free[i] = false;
                true
            }
            None => false,
        }
    }

    pub fn fill_all(&mut self) {
        self.free.fill(false);
    }

    pub fn free_count(&self) -> usize {
        self.free.iter().filter(|&&f| f).count()
    }

    pub fn can_fit(&self, gx: i64, gy: i64, glyph: &GlyphInfo, allow_out_of_bounds: bool) -> bool {
        for (ox, oy) in glyph.occupied() {
            match self.is_free(gx + i64::from(ox), gy + i64::from(oy)) {
                None if allow_out_of_bounds => {}
                None | Some(false) => return false,
                Some(true) => {}
            }
        }
        true
    }

    /// Marks every in-bounds occupied cell and returns those cells.
    pub fn mark_filled(&mut self, gx: i64, gy: i64, glyph: &GlyphInfo) -> Vec<(usize, usize)> {
        let mut filled = Vec::with_capacity(glyph.occupied_len());
        for (ox, oy) in glyph.occupied() {
            let (x, y) = (gx + i64::from(ox), gy + i64::from(oy));
            if self.set_filled(x, y) {
                filled.push((x as usize, y as usize));
            }
        }
        filled
    }

    /// Row-major text picture, `.` free and `#` filled.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.free.chunks(self.width.max(1)) {
            out.extend(row.iter().map(|&f| if f { '.' } else { '#' }));
            out.push('\n');
        }
        out
    }
}

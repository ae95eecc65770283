use std::{fmt, fs, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cli::{Cli, ShapeArg},
    render::{
        canvas::Canvas,
        color::{ColorParseError, WordColor, parse_css_color},
        elements::{ElementFactory, default_element_factory},
    },
};

pub const DEFAULT_FONT_FAMILY: &str =
    "\"Trebuchet MS\", \"Heiti TC\", \"微軟正黑體\", \"Arial Unicode MS\", \"Droid Fallback Sans\", sans-serif";
pub const MIN_GRID_SIZE: u32 = 4;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("{field}: {source}")]
    Color {
        field: &'static str,
        #[source]
        source: ColorParseError,
    },
    #[error("ellipticity must be a positive finite number, got {0}")]
    Ellipticity(f64),
    #[error("mask gap {gap} must be within 0..{grid_size}")]
    MaskGap { gap: f32, grid_size: u32 },
    #[error("minimum size must be a non-negative number, got {0}")]
    MinSize(f32),
    #[error("grid size must be a finite number, got {0}")]
    GridSize(f32),
    #[error("weight factor must be a finite number, got {0}")]
    WeightFactor(f32),
}

pub type SizeFn = Arc<dyn Fn(f32) -> f32 + Send + Sync>;
pub type FontWeightFn = Arc<dyn Fn(&str, f32, f32) -> String + Send + Sync>;
pub type ShapeFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;
pub type AbortCallback = Arc<dyn Fn() + Send + Sync>;
pub type CanvasPainter = Arc<dyn Fn(&mut Canvas) + Send + Sync>;

/// Maps a word's weight to its font size in pixels.
#[derive(Clone)]
pub enum WeightScale {
    Linear(f32),
    Custom(SizeFn),
}

impl WeightScale {
    pub fn font_size(&self, weight: f32) -> f32 {
        match self {
            Self::Linear(factor) => weight * factor,
            Self::Custom(f) => f(weight),
        }
    }
}

#[derive(Clone)]
pub enum FontWeight {
    Fixed(String),
    Custom(FontWeightFn),
}

impl FontWeight {
    pub fn resolve(&self, word: &str, weight: f32, font_size: f32) -> String {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Custom(f) => f(word, weight, font_size),
        }
    }
}

/// Polar distortion applied to the search spiral.
#[derive(Clone)]
pub enum Shape {
    Circle,
    Square,
    Custom(ShapeFn),
}

impl Shape {
    /// Radius multiplier at `theta`; `None` for the circle shortcut.
    pub fn factor(&self, theta: f64) -> Option<f64> {
        match self {
            Self::Circle => None,
            Self::Square => Some((1.0 / theta.cos().abs()).min(1.0 / theta.sin().abs())),
            Self::Custom(f) => Some(f(theta)),
        }
    }
}

impl From<ShapeArg> for Shape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Circle => Self::Circle,
            ShapeArg::Square => Self::Square,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridSeed {
    /// Paint the background and start from an empty grid.
    #[default]
    Clear,
    /// Treat every non-background pixel already on the canvas as occupied.
    Preserve,
}

#[derive(Clone)]
pub struct CloudOptions {
    pub grid_size: u32,
    pub weight_scale: WeightScale,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub color: WordColor,
    pub min_size: f32,
    pub seed: GridSeed,
    pub background_color: String,
    pub draw_out_of_bound: bool,
    pub shrink_to_fit: bool,
    pub origin: Option<(f32, f32)>,
    pub draw_mask: bool,
    pub mask_color: String,
    pub mask_gap_width: f32,
    pub shape: Shape,
    pub ellipticity: f64,
    pub wait: Duration,
    pub abort_threshold: Option<Duration>,
    pub abort: Option<AbortCallback>,
    pub create_element: ElementFactory,
    /// Paints a freshly cleared canvas in place of the plain background fill,
    /// when the canvas is built and after every resize. Preserve-mode artwork
    /// such as a text mask lives here.
    pub repaint: Option<CanvasPainter>,
}

impl Default for CloudOptions {
    fn default() -> Self {
        Self {
            grid_size: 8,
            weight_scale: WeightScale::Linear(1.0),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::Fixed("normal".to_string()),
            color: WordColor::RandomDark,
            min_size: 0.0,
            seed: GridSeed::Clear,
            background_color: "#fff".to_string(),
            draw_out_of_bound: false,
            shrink_to_fit: false,
            origin: None,
            draw_mask: false,
            mask_color: "rgba(255,0,0,0.3)".to_string(),
            mask_gap_width: 0.3,
            shape: Shape::Circle,
            ellipticity: 0.65,
            wait: Duration::ZERO,
            abort_threshold: None,
            abort: None,
            create_element: default_element_factory(),
            repaint: None,
        }
    }
}

impl fmt::Debug for CloudOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudOptions")
            .field("grid_size", &self.grid_size)
            .field("font_family", &self.font_family)
            .field("color", &self.color)
            .field("min_size", &self.min_size)
            .field("seed", &self.seed)
            .field("background_color", &self.background_color)
            .field("draw_out_of_bound", &self.draw_out_of_bound)
            .field("shrink_to_fit", &self.shrink_to_fit)
            .field("origin", &self.origin)
            .field("draw_mask", &self.draw_mask)
            .field("ellipticity", &self.ellipticity)
            .field("wait", &self.wait)
            .field("abort_threshold", &self.abort_threshold)
            .finish_non_exhaustive()
    }
}

impl CloudOptions {
    /// Checks every field and coerces the grid size to a whole number ≥ 4.
    pub fn validated(mut self) -> Result<Self, OptionsError> {
        self.grid_size = self.grid_size.max(MIN_GRID_SIZE);

        if !self.ellipticity.is_finite() || self.ellipticity <= 0.0 {
            return Err(OptionsError::Ellipticity(self.ellipticity));
        }
        if !self.min_size.is_finite() || self.min_size < 0.0 {
            return Err(OptionsError::MinSize(self.min_size));
        }
        #[allow(clippy::cast_precision_loss)]
        let cell = self.grid_size as f32;
        if !(0.0..cell).contains(&self.mask_gap_width) {
            return Err(OptionsError::MaskGap {
                gap: self.mask_gap_width,
                grid_size: self.grid_size,
            });
        }
        if let WeightScale::Linear(factor) = self.weight_scale
            && !factor.is_finite()
        {
            return Err(OptionsError::WeightFactor(factor));
        }

        check_color("backgroundColor", &self.background_color)?;
        check_color("maskColor", &self.mask_color)?;
        if let WordColor::Fixed(css) = &self.color {
            check_color("color", css)?;
        }
        self.abort_threshold = self.abort_threshold.filter(|t| !t.is_zero());
        Ok(self)
    }

    /// Applies every key present in `file` on top of `self`, then validates.
    pub fn merge_file(mut self, file: OptionsFile) -> Result<Self, OptionsError> {
        if let Some(grid_size) = file.grid_size {
            self.grid_size = coerce_grid_size(grid_size)?;
        }
        if let Some(factor) = file.weight_factor {
            self.weight_scale = WeightScale::Linear(factor);
        }
        if let Some(family) = file.font_family {
            self.font_family = family;
        }
        if let Some(weight) = file.font_weight {
            self.font_weight = FontWeight::Fixed(weight);
        }
        if let Some(color) = file.color {
            self.color = WordColor::from_keyword(&color).map_err(|source| OptionsError::Color {
                field: "color",
                source,
            })?;
        }
        if let Some(min_size) = file.min_size {
            self.min_size = min_size;
        }
        if let Some(clear) = file.clear_canvas {
            self.seed = if clear {
                GridSeed::Clear
            } else {
                GridSeed::Preserve
            };
        }
        if let Some(background) = file.background_color {
            self.background_color = background;
        }
        if let Some(flag) = file.draw_out_of_bound {
            self.draw_out_of_bound = flag;
        }
        if let Some(flag) = file.shrink_to_fit {
            self.shrink_to_fit = flag;
        }
        if let Some([x, y]) = file.origin {
            self.origin = Some((x, y));
        }
        if let Some(flag) = file.draw_mask {
            self.draw_mask = flag;
        }
        if let Some(color) = file.mask_color {
            self.mask_color = color;
        }
        if let Some(gap) = file.mask_gap_width {
            self.mask_gap_width = gap;
        }
        if let Some(shape) = file.shape {
            self.shape = shape.into();
        }
        if let Some(ellipticity) = file.ellipticity {
            self.ellipticity = ellipticity;
        }
        if let Some(wait) = file.wait {
            self.wait = Duration::from_millis(wait);
        }
        if let Some(threshold) = file.abort_threshold {
            self.abort_threshold = Some(Duration::from_millis(threshold));
        }
        self.validated()
    }

    /// CLI flags win over whatever the options file set.
    pub fn apply_cli(mut self, cli: &Cli) -> Result<Self, OptionsError> {
        if let Some(grid_size) = cli.grid_size {
            self.grid_size = grid_size;
        }
        if let Some(factor) = cli.weight_factor {
            self.weight_scale = WeightScale::Linear(factor);
        }
        if let Some(family) = &cli.font_family {
            self.font_family.clone_from(family);
        }
        if let Some(weight) = &cli.font_weight {
            self.font_weight = FontWeight::Fixed(weight.clone());
        }
        if let Some(color) = &cli.color {
            self.color = WordColor::from_keyword(color).map_err(|source| OptionsError::Color {
                field: "color",
                source,
            })?;
        }
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if cli.preserve_canvas() {
            self.seed = GridSeed::Preserve;
        }
        if let Some(background) = &cli.background {
            self.background_color.clone_from(background);
        }
        self.draw_out_of_bound |= cli.draw_out_of_bound;
        self.shrink_to_fit |= cli.shrink_to_fit;
        if cli.origin.is_some() {
            self.origin = cli.origin;
        }
        self.draw_mask |= cli.draw_mask;
        if let Some(color) = &cli.mask_color {
            self.mask_color.clone_from(color);
        }
        if let Some(gap) = cli.mask_gap {
            self.mask_gap_width = gap;
        }
        if let Some(shape) = cli.shape {
            self.shape = shape.into();
        }
        if let Some(ellipticity) = cli.ellipticity {
            self.ellipticity = ellipticity;
        }
        if let Some(wait) = cli.wait_ms {
            self.wait = Duration::from_millis(wait);
        }
        if let Some(threshold) = cli.abort_threshold_ms {
            self.abort_threshold = Some(Duration::from_millis(threshold));
        }
        self.validated()
    }
}

fn check_color(field: &'static str, css: &str) -> Result<(), OptionsError> {
    parse_css_color(css)
        .map(|_| ())
        .map_err(|source| OptionsError::Color { field, source })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn coerce_grid_size(raw: f32) -> Result<u32, OptionsError> {
    if !raw.is_finite() {
        return Err(OptionsError::GridSize(raw));
    }
    Ok(raw.floor().max(MIN_GRID_SIZE as f32) as u32)
}

/// On-disk options; unknown keys are rejected rather than silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionsFile {
    pub grid_size: Option<f32>,
    pub weight_factor: Option<f32>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub color: Option<String>,
    pub min_size: Option<f32>,
    pub clear_canvas: Option<bool>,
    pub background_color: Option<String>,
    pub draw_out_of_bound: Option<bool>,
    pub shrink_to_fit: Option<bool>,
    pub origin: Option<[f32; 2]>,
    pub draw_mask: Option<bool>,
    pub mask_color: Option<String>,
    pub mask_gap_width: Option<f32>,
    pub shape: Option<ShapeArg>,
    pub ellipticity: Option<f64>,
    /// Milliseconds between words.
    pub wait: Option<u64>,
    /// Milliseconds one word may take before the run aborts.
    pub abort_threshold: Option<u64>,
}

pub fn load_options_file(path: &Path) -> anyhow::Result<OptionsFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading options file {} failed", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing options file {} failed", path.display()))
}

#[cfg(test)]
mod tests;

#![allow(clippy::missing_errors_doc)]

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeArg {
    #[default]
    Circle,
    Square,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputArg {
    Canvas,
    Elements,
    Both,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Parser, Clone)]
#[command(
    name = "word-cloud",
    version,
    about = "Spiral-packed word cloud renderer"
)]
pub struct Cli {
    /// JSON word list: `[["word", weight], ...]` or `[{"word": .., "weight": ..}]`
    pub words: PathBuf,

    /// Surface width in pixels
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// JSON options file with camelCase keys (gridSize, weightFactor, ...)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Grid cell size in pixels (min 4)
    #[arg(long)]
    pub grid_size: Option<u32>,

    /// Font size per unit of weight
    #[arg(long)]
    pub weight_factor: Option<f32>,

    #[arg(long)]
    pub font_family: Option<String>,

    #[arg(long)]
    pub font_weight: Option<String>,

    /// CSS color, random-dark or random-light
    #[arg(long)]
    pub color: Option<String>,

    /// Words at or below this font size are skipped (0 disables)
    #[arg(long)]
    pub min_size: Option<f32>,

    /// Background CSS color
    #[arg(long)]
    pub background: Option<String>,

    /// Keep existing pixels and treat them as occupied
    #[arg(long)]
    pub preserve: bool,

    /// Allow words to hang over the surface edge
    #[arg(long)]
    pub draw_out_of_bound: bool,

    /// Shrink words that do not fit instead of dropping them
    #[arg(long)]
    pub shrink_to_fit: bool,

    /// Cloud center in pixels as `x,y` (default: surface center)
    #[arg(long, value_parser = parse_origin)]
    pub origin: Option<(f32, f32)>,

    /// Paint filled grid cells onto the canvas
    #[arg(long)]
    pub draw_mask: bool,

    #[arg(long)]
    pub mask_color: Option<String>,

    #[arg(long)]
    pub mask_gap: Option<f32>,

    #[arg(long, value_enum)]
    pub shape: Option<ShapeArg>,

    /// Vertical squash of the search spiral
    #[arg(long)]
    pub ellipticity: Option<f64>,

    /// Delay between words in milliseconds
    #[arg(long)]
    pub wait_ms: Option<u64>,

    /// Abort the run when one word takes longer than this (0 disables)
    #[arg(long)]
    pub abort_threshold_ms: Option<u64>,

    /// Reserve this text as a silhouette the cloud flows around
    #[arg(long)]
    pub mask_text: Option<String>,

    #[arg(long, default_value_t = 96.0)]
    pub mask_font_size: f32,

    /// Output PNG path
    #[arg(long, short, default_value = "wordcloud.png")]
    pub out: PathBuf,

    /// Write positioned text elements as JSON
    #[arg(long)]
    pub elements: Option<PathBuf>,

    /// Which targets receive placed words
    #[arg(long, value_enum, default_value_t = OutputArg::Both)]
    pub output: OutputArg,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.elements.is_some() && self.output == OutputArg::Canvas {
            anyhow::bail!("--elements needs --output elements or both");
        }
        if let Some(text) = &self.mask_text {
            if text.trim().is_empty() {
                anyhow::bail!("--mask-text must not be blank");
            }
            if self.output == OutputArg::Elements {
                anyhow::bail!("--mask-text needs a canvas, use --output canvas or both");
            }
        }
        if self.mask_font_size <= 0.0 {
            anyhow::bail!("--mask-font-size must be positive");
        }
        Ok(())
    }

    #[must_use]
    pub fn preserve_canvas(&self) -> bool {
        self.preserve || self.mask_text.is_some()
    }
}

fn parse_origin(raw: &str) -> Result<(f32, f32), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {raw:?}"))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

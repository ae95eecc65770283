#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]

use std::{fmt, sync::Arc, sync::OnceLock};

use image::Rgba;
use rand::Rng;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized color {0:?}")]
pub struct ColorParseError(pub String);

/// Inputs handed to a per-word color function.
#[derive(Debug, Clone, Copy)]
pub struct ColorContext<'a> {
    pub word: &'a str,
    pub weight: f32,
    pub font_size: f32,
    pub distance: usize,
    pub theta: f64,
}

pub type ColorFn = Arc<dyn Fn(&ColorContext<'_>) -> String + Send + Sync>;

#[derive(Clone)]
pub enum WordColor {
    Fixed(String),
    RandomDark,
    RandomLight,
    Custom(ColorFn),
}

impl Default for WordColor {
    fn default() -> Self {
        Self::RandomDark
    }
}

impl fmt::Debug for WordColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(css) => f.debug_tuple("Fixed").field(css).finish(),
            Self::RandomDark => f.write_str("RandomDark"),
            Self::RandomLight => f.write_str("RandomLight"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl WordColor {
    /// `random-dark` and `random-light` select the random families, anything
    /// else is taken as a fixed CSS color.
    pub fn from_keyword(value: &str) -> Result<Self, ColorParseError> {
        match value.trim() {
            "random-dark" => Ok(Self::RandomDark),
            "random-light" => Ok(Self::RandomLight),
            other => {
                parse_css_color(other)?;
                Ok(Self::Fixed(other.to_string()))
            }
        }
    }

    pub fn resolve(&self, ctx: &ColorContext<'_>) -> String {
        match self {
            Self::Fixed(css) => css.clone(),
            Self::RandomDark => random_hsl(10.0, 50.0),
            Self::RandomLight => random_hsl(50.0, 90.0),
            Self::Custom(f) => f(ctx),
        }
    }
}

fn random_hsl(min_light: f32, max_light: f32) -> String {
    let mut rng = rand::rng();
    let hue = rng.random_range(0.0f32..360.0);
    let saturation = rng.random_range(70.0f32..100.0);
    let lightness = rng.random_range(min_light..max_light);
    format!("hsl({hue:.0},{saturation:.0}%,{lightness:.0}%)")
}

fn functional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(rgba?|hsla?)\(\s*([^,\s]+)\s*,\s*([^,\s]+)\s*,\s*([^,\s)]+)\s*(?:,\s*([^,\s)]+)\s*)?\)$")
            .expect("static color regex")
    })
}

pub fn parse_css_color(input: &str) -> Result<Rgba<u8>, ColorParseError> {
    let value = input.trim().to_ascii_lowercase();
    let err = || ColorParseError(input.to_string());

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(err);
    }

    if let Some(named) = named_color(&value) {
        return Ok(named);
    }

    let caps = functional_re().captures(&value).ok_or_else(err)?;
    let func = &caps[1];
    let alpha = match caps.get(5) {
        Some(a) => parse_alpha(a.as_str()).ok_or_else(err)?,
        None => 255,
    };

    if func.starts_with("rgb") {
        let r = parse_channel(&caps[2]).ok_or_else(err)?;
        let g = parse_channel(&caps[3]).ok_or_else(err)?;
        let b = parse_channel(&caps[4]).ok_or_else(err)?;
        Ok(Rgba([r, g, b, alpha]))
    } else {
        let h = caps[2]
            .trim_end_matches("deg")
            .parse::<f32>()
            .map_err(|_| err())?;
        let s = parse_percent(&caps[3]).ok_or_else(err)?;
        let l = parse_percent(&caps[4]).ok_or_else(err)?;
        let [r, g, b] = hsl_to_rgb(h, s, l);
        Ok(Rgba([r, g, b, alpha]))
    }
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let digit = |c: char| c.to_digit(16).map(|d| d as u8);
    let chars = hex.chars().collect::<Vec<_>>();
    match chars.len() {
        3 | 4 => {
            let mut out = [255u8; 4];
            for (slot, c) in out.iter_mut().zip(&chars) {
                let d = digit(*c)?;
                *slot = d * 17;
            }
            Some(Rgba(out))
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for (slot, pair) in out.iter_mut().zip(chars.chunks(2)) {
                *slot = digit(pair[0])? * 16 + digit(pair[1])?;
            }
            Some(Rgba(out))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgba<u8>> {
    let rgba = match name {
        "transparent" => [0, 0, 0, 0],
        "white" => [255, 255, 255, 255],
        "black" => [0, 0, 0, 255],
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        _ => return None,
    };
    Some(Rgba(rgba))
}

fn parse_channel(raw: &str) -> Option<u8> {
    if let Some(pct) = raw.strip_suffix('%') {
        let v = pct.parse::<f32>().ok()?;
        return Some((v.clamp(0.0, 100.0) * 2.55).round() as u8);
    }
    let v = raw.parse::<f32>().ok()?;
    Some(v.clamp(0.0, 255.0).round() as u8)
}

fn parse_alpha(raw: &str) -> Option<u8> {
    let unit = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
        None => raw.parse::<f32>().ok()?,
    };
    Some((unit.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_percent(raw: &str) -> Option<f32> {
    let v = raw.strip_suffix('%').unwrap_or(raw).parse::<f32>().ok()?;
    Some((v / 100.0).clamp(0.0, 1.0))
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0) / 360.0;
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

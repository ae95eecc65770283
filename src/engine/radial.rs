#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::f64::consts::TAU;

use crate::app::options::Shape;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialPoint {
    pub x: f64,
    pub y: f64,
    /// Angle the point was sampled at; passed through to color hooks.
    pub theta: f64,
}

/// Ring-by-ring candidate generator around the cloud center, cached per radius.
#[derive(Clone)]
pub struct RadialSearch {
    center: (f64, f64),
    shape: Shape,
    ellipticity: f64,
    max_radius: usize,
    rings: Vec<Option<Vec<RadialPoint>>>,
}

impl RadialSearch {
    #[must_use]
    pub fn new(center: (f64, f64), shape: Shape, ellipticity: f64, grid: (usize, usize)) -> Self {
        let max_radius = max_radius_for(grid.0, grid.1);
        Self {
            center,
            shape,
            ellipticity,
            max_radius,
            rings: vec![None; max_radius + 1],
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn max_radius(&self) -> usize {
        self.max_radius
    }

    pub fn points_at(&mut self, radius: usize) -> &[RadialPoint] {
        if radius >= self.rings.len() {
            self.rings.resize(radius + 1, None);
        }
        let (center, shape, ellipticity) = (self.center, &self.shape, self.ellipticity);
        self.rings[radius].get_or_insert_with(|| ring(center, shape, ellipticity, radius))
    }

    pub fn cached_rings(&self) -> usize {
        self.rings.iter().filter(|r| r.is_some()).count()
    }
}

/// Radius at which the ring has swept the grid's diagonal.
pub fn max_radius_for(width: usize, height: usize) -> usize {
    let (w, h) = (width as f64, height as f64);
    (w * w + h * h).sqrt().floor() as usize
}

fn ring(center: (f64, f64), shape: &Shape, ellipticity: f64, radius: usize) -> Vec<RadialPoint> {
    if radius == 0 {
        return vec![RadialPoint {
            x: center.0,
            y: center.1,
            theta: 0.0,
        }];
    }

    let total = radius * 8;
    let r = radius as f64;
    (0..total)
        .rev()
        .map(|t| {
            let theta = t as f64 / total as f64 * TAU;
            let rx = shape.factor(theta).unwrap_or(1.0);
            RadialPoint {
                x: center.0 + r * rx * (-theta).cos(),
                y: center.1 + r * rx * (-theta).sin() * ellipticity,
                theta,
            }
        })
        .collect()
}

//! Mollweide equal-area projection.
//!
//! A pseudo-cylindrical projection that shows the whole globe as a 2:1
//! ellipse. Meridians are elliptical arcs, parallels are straight lines.
//!
//! Forward equations (unit sphere, central meridian λ0):
//! - `2θ + sin(2θ) = π·sin(φ)`, solved for the auxiliary angle θ
//! - `x = (2√2/π)·(λ - λ0)·cos(θ)`
//! - `y = √2·sin(θ)`
//!
//! Projected coordinates therefore span `x ∈ [-2√2, 2√2]`,
//! `y ∈ [-√2, √2]`.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use crate::error::ProjectionError;

/// Newton iterations are stopped once the step is below this (radians).
const THETA_TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: usize = 50;

/// Mollweide projection on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mollweide {
    /// Central meridian in degrees
    central_longitude: f64,
}

impl Mollweide {
    /// Create a projection centered on `central_longitude` (degrees).
    pub fn new(central_longitude: f64) -> Result<Self, ProjectionError> {
        if !central_longitude.is_finite() || central_longitude.abs() > 360.0 {
            return Err(ProjectionError::InvalidCentralLongitude(central_longitude));
        }
        Ok(Self {
            central_longitude: normalize_longitude(central_longitude),
        })
    }

    /// Central meridian in degrees, normalized to [-180, 180).
    pub fn central_longitude(&self) -> f64 {
        self.central_longitude
    }

    /// Half-width of the map ellipse in projected units.
    pub fn x_extent(&self) -> f64 {
        2.0 * SQRT_2
    }

    /// Half-height of the map ellipse in projected units.
    pub fn y_extent(&self) -> f64 {
        SQRT_2
    }

    /// Longitude relative to the central meridian, in [-180, 180).
    pub fn relative_longitude(&self, lon_deg: f64) -> f64 {
        normalize_longitude(lon_deg - self.central_longitude)
    }

    /// Project geographic coordinates (degrees) to map coordinates.
    ///
    /// Returns None for non-finite input or latitudes beyond the poles.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() || lat_deg.abs() > 90.0 {
            return None;
        }

        let lambda = self.relative_longitude(lon_deg).to_radians();
        let theta = auxiliary_angle(lat_deg.to_radians());

        let x = (2.0 * SQRT_2 / PI) * lambda * theta.cos();
        let y = SQRT_2 * theta.sin();
        Some((x, y))
    }

    /// Map coordinates back to geographic (lon, lat) in degrees.
    ///
    /// Returns None when the point lies outside the map ellipse.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !self.contains(x, y) {
            return None;
        }

        let theta = (y / SQRT_2).clamp(-1.0, 1.0).asin();
        let lat = ((2.0 * theta + (2.0 * theta).sin()) / PI)
            .clamp(-1.0, 1.0)
            .asin();

        let cos_theta = theta.cos();
        let lambda = if cos_theta.abs() < 1e-12 {
            0.0
        } else {
            PI * x / (2.0 * SQRT_2 * cos_theta)
        };

        // Rim points can land a hair past ±π
        let lambda = lambda.clamp(-PI, PI);
        let lon = normalize_longitude(self.central_longitude + lambda.to_degrees());

        Some((lon, lat.to_degrees()))
    }

    /// Whether a map coordinate lies inside the projection ellipse.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let nx = x / self.x_extent();
        let ny = y / self.y_extent();
        nx * nx + ny * ny <= 1.0
    }
}

/// Solve `2θ + sin(2θ) = π·sin(φ)` for θ with Newton-Raphson.
fn auxiliary_angle(phi: f64) -> f64 {
    // The derivative vanishes at the poles; the answer there is exact
    if (phi.abs() - FRAC_PI_2).abs() < 1e-9 {
        return phi.signum() * FRAC_PI_2;
    }

    let target = PI * phi.sin();
    let mut theta = phi;
    for _ in 0..MAX_ITERATIONS {
        let f = 2.0 * theta + (2.0 * theta).sin() - target;
        let df = 2.0 + 2.0 * (2.0 * theta).cos();
        if df.abs() < 1e-15 {
            break;
        }
        let step = f / df;
        theta -= step;
        if step.abs() < THETA_TOLERANCE {
            break;
        }
    }
    theta
}

/// Wrap a longitude in degrees into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

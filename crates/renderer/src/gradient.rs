//! Diverging color scales for anomaly values.
//!
//! A [`ColorScale`] quantizes the style's gradient into a fixed lookup table
//! over `[vmin, vmax]`. Values outside the bounds clamp to the end colors and
//! NaN maps to the style's missing color.

use image::Rgb;

use crate::error::{RenderError, RenderResult};
use crate::style::{hex_to_rgb, StyleConfig, StyleDefinition, DEFAULT_STYLE};

/// Number of discrete colors in a scale's lookup table.
pub const COLORMAP_SIZE: usize = 256;

/// Grey used for cells without data.
pub const MISSING_GREY: Color = Color::new(128, 128, 128);

/// Color value in RGB format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let (r, g, b) = hex_to_rgb(hex)?;
        Some(Self::new(r, g, b))
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
    )
}

/// A quantized value-to-color mapping with fixed bounds.
#[derive(Debug, Clone)]
pub struct ColorScale {
    vmin: f32,
    vmax: f32,
    lut: Vec<Color>,
    missing: Color,
}

impl ColorScale {
    /// Build a scale from a style's stops, stretched over `[vmin, vmax]`.
    ///
    /// Stop values only fix the relative position of each color; the first
    /// stop lands on `vmin` and the last on `vmax`.
    pub fn from_style(style: &StyleDefinition, vmin: f32, vmax: f32) -> RenderResult<Self> {
        if !vmin.is_finite() || !vmax.is_finite() || vmin >= vmax {
            return Err(RenderError::Style(format!(
                "color bounds must satisfy vmin < vmax, got [{}, {}]",
                vmin, vmax
            )));
        }

        let stops = style.sorted_stops();
        let (first, last) = match (stops.first(), stops.last()) {
            (Some(first), Some(last)) if last.value > first.value => (first.value, last.value),
            _ => {
                return Err(RenderError::Style(format!(
                    "style '{}' needs at least two distinct stops",
                    style.name
                )))
            }
        };

        let anchors = stops
            .iter()
            .map(|stop| {
                let color = Color::from_hex(&stop.color).ok_or_else(|| {
                    RenderError::Style(format!("invalid color '{}' in '{}'", stop.color, style.name))
                })?;
                Ok(((stop.value - first) / (last - first), color))
            })
            .collect::<RenderResult<Vec<(f32, Color)>>>()?;

        let missing = match style.missing_color.as_deref() {
            Some(hex) => Color::from_hex(hex)
                .ok_or_else(|| RenderError::Style(format!("invalid missing color '{}'", hex)))?,
            None => MISSING_GREY,
        };

        let lut = (0..COLORMAP_SIZE)
            .map(|i| sample_anchors(&anchors, i as f32 / (COLORMAP_SIZE - 1) as f32))
            .collect();

        Ok(Self {
            vmin,
            vmax,
            lut,
            missing,
        })
    }

    /// The built-in `seismic` scale over `[vmin, vmax]`.
    pub fn seismic(vmin: f32, vmax: f32) -> RenderResult<Self> {
        let config = StyleConfig::builtin()?;
        Self::from_style(config.require_style(DEFAULT_STYLE)?, vmin, vmax)
    }

    pub fn vmin(&self) -> f32 {
        self.vmin
    }

    pub fn vmax(&self) -> f32 {
        self.vmax
    }

    pub fn missing_color(&self) -> Color {
        self.missing
    }

    /// Color for a data value.
    pub fn color_for(&self, value: f32) -> Color {
        if value.is_nan() {
            return self.missing;
        }
        let t = (value - self.vmin) / (self.vmax - self.vmin);
        self.color_at_fraction(t)
    }

    /// Color at a normalized position, 0 = `vmin`, 1 = `vmax`.
    pub fn color_at_fraction(&self, t: f32) -> Color {
        let idx = (t * COLORMAP_SIZE as f32).floor();
        let idx = if idx.is_nan() {
            0
        } else {
            idx.clamp(0.0, (COLORMAP_SIZE - 1) as f32) as usize
        };
        self.lut[idx]
    }
}

fn sample_anchors(anchors: &[(f32, Color)], t: f32) -> Color {
    match anchors.iter().position(|&(pos, _)| pos >= t) {
        Some(0) => anchors[0].1,
        Some(hi) => {
            let (p0, c0) = anchors[hi - 1];
            let (p1, c1) = anchors[hi];
            let span = p1 - p0;
            if span <= f32::EPSILON {
                c1
            } else {
                interpolate_color(c0, c1, (t - p0) / span)
            }
        }
        None => anchors[anchors.len() - 1].1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_color_midpoint() {
        let c = interpolate_color(Color::black(), Color::white(), 0.5);
        assert_eq!(c, Color::new(128, 128, 128));
        assert_eq!(interpolate_color(Color::black(), Color::white(), 2.0), Color::white());
    }

    #[test]
    fn test_seismic_endpoints_and_clamp() {
        let scale = ColorScale::seismic(-3.0, 3.0).unwrap();
        assert_eq!(scale.color_for(-3.0), Color::new(0, 0, 76));
        assert_eq!(scale.color_for(3.0), Color::new(128, 0, 0));
        assert_eq!(scale.color_for(-10.0), scale.color_for(-3.0));
        assert_eq!(scale.color_for(42.0), scale.color_for(3.0));
    }

    #[test]
    fn test_seismic_is_diverging() {
        let scale = ColorScale::seismic(-3.0, 3.0).unwrap();

        let cold = scale.color_for(-1.5);
        assert!(cold.b > 200 && cold.r < 10, "expected blue, got {:?}", cold);

        let warm = scale.color_for(1.5);
        assert!(warm.r > 200 && warm.b < 10, "expected red, got {:?}", warm);

        let neutral = scale.color_for(0.0);
        assert!(neutral.r > 240 && neutral.g > 240 && neutral.b > 240);
    }

    #[test]
    fn test_nan_is_missing_grey() {
        let scale = ColorScale::seismic(-3.0, 3.0).unwrap();
        assert_eq!(scale.color_for(f32::NAN), MISSING_GREY);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(ColorScale::seismic(3.0, -3.0).is_err());
        assert!(ColorScale::seismic(1.0, 1.0).is_err());
        assert!(ColorScale::seismic(f32::NAN, 1.0).is_err());
    }
}

//! Style configuration for anomaly color scales.
//!
//! Styles are JSON documents mapping data values to colors through a list of
//! stops. The built-in set lives in `styles/anomaly.json` and is compiled into
//! the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Built-in anomaly styles.
pub const BUILTIN_STYLES: &str = include_str!("../styles/anomaly.json");

/// Style used when none is configured.
pub const DEFAULT_STYLE: &str = "seismic";

/// Style configuration loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    pub version: String,
    pub styles: HashMap<String, StyleDefinition>,
}

/// A single style definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub style_type: String,
    pub units: Option<String>,
    pub stops: Vec<ColorStop>,
    /// Color for cells without data (hex)
    pub missing_color: Option<String>,
    pub legend: Option<Legend>,
}

/// Color stop for gradient
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f32,
    pub color: String,
    pub label: Option<String>,
}

/// Legend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Legend {
    pub title: Option<String>,
    pub orientation: Option<String>,
    /// Explicit tick values; generated from the range when absent
    pub ticks: Option<Vec<f32>>,
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> RenderResult<Self> {
        serde_json::from_str(json_str).map_err(|e| RenderError::Style(e.to_string()))
    }

    /// Load style configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The styles compiled into this crate.
    pub fn builtin() -> RenderResult<Self> {
        Self::from_json(BUILTIN_STYLES)
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// Like [`StyleConfig::get_style`], but a missing name is an error.
    pub fn require_style(&self, name: &str) -> RenderResult<&StyleDefinition> {
        self.get_style(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.styles.keys().map(String::as_str).collect();
            known.sort_unstable();
            RenderError::Style(format!(
                "unknown style '{}' (available: {})",
                name,
                known.join(", ")
            ))
        })
    }
}

impl StyleDefinition {
    /// Stops sorted by value.
    pub fn sorted_stops(&self) -> Vec<ColorStop> {
        let mut stops = self.stops.clone();
        stops.sort_by(|a, b| a.value.total_cmp(&b.value));
        stops
    }

    /// Lowest and highest stop value.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let stops = self.sorted_stops();
        Some((stops.first()?.value, stops.last()?.value))
    }

    /// Colorbar label, falling back to the units.
    pub fn legend_title(&self) -> Option<&str> {
        self.legend
            .as_ref()
            .and_then(|l| l.title.as_deref())
            .or(self.units.as_deref())
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

//! Coastline overlay from GeoJSON polylines.
//!
//! Accepts a FeatureCollection (or a bare Feature/geometry) whose geometries
//! are `LineString`, `MultiLineString`, `Polygon` or `MultiPolygon`; polygon
//! rings are drawn as closed lines. Other geometry types are ignored.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use projection::Mollweide;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GeometryError, RenderError, RenderResult};
use crate::layout::MapEllipse;

type Position = Vec<f64>;

/// Latitudes this far past a pole are rounding noise and are clamped onto it.
const POLE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
    #[serde(default)]
    geometries: Vec<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Document {
    FeatureCollection { features: Vec<RawFeature> },
    Feature { geometry: Option<RawGeometry> },
}

/// A set of (lon, lat) polylines.
#[derive(Debug, Clone, Default)]
pub struct Coastlines {
    lines: Vec<Vec<(f64, f64)>>,
}

impl Coastlines {
    pub fn from_lines(lines: Vec<Vec<(f64, f64)>>) -> Self {
        Self { lines }
    }

    /// Parse GeoJSON text.
    pub fn from_geojson(json: &str) -> RenderResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| RenderError::Coastline(e.to_string()))?;

        let geometries = match value.get("type").and_then(|t| t.as_str()) {
            Some("FeatureCollection") | Some("Feature") => {
                match serde_json::from_value::<Document>(value)
                    .map_err(|e| RenderError::Coastline(e.to_string()))?
                {
                    Document::FeatureCollection { features } => {
                        features.into_iter().filter_map(|f| f.geometry).collect()
                    }
                    Document::Feature { geometry } => geometry.into_iter().collect(),
                }
            }
            Some(_) => vec![serde_json::from_value::<RawGeometry>(value)
                .map_err(|e| RenderError::Coastline(e.to_string()))?],
            None => {
                return Err(RenderError::Coastline(
                    "document has no \"type\" member".to_string(),
                ))
            }
        };

        let mut lines = Vec::new();
        for geometry in geometries {
            collect_lines(geometry, &mut lines)?;
        }

        let coastlines = Self { lines };
        debug!(
            lines = coastlines.len(),
            vertices = coastlines.vertex_count(),
            "Parsed coastlines"
        );
        Ok(coastlines)
    }

    /// Read and parse a GeoJSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_geojson(&content)
    }

    pub fn lines(&self) -> &[Vec<(f64, f64)>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    /// Project every line and stroke it onto `canvas`.
    ///
    /// Segments that jump across the projection seam are left out, so a line
    /// crossing the antimeridian of the center is split rather than smeared
    /// across the map.
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        ellipse: &MapEllipse,
        projection: &Mollweide,
        color: Rgb<u8>,
    ) -> Result<(), GeometryError> {
        for line in &self.lines {
            let mut previous: Option<(f64, (f32, f32))> = None;

            for &(lon, lat) in line {
                let (x, y) = projection
                    .forward(lon, lat)
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .ok_or(GeometryError::UnprojectableVertex { lon, lat })?;
                let relative = projection.relative_longitude(lon);
                let point = ellipse.to_pixel(x, y, projection);

                if let Some((prev_relative, prev_point)) = previous {
                    if (relative - prev_relative).abs() <= 180.0 {
                        draw_line_segment_mut(canvas, prev_point, point, color);
                    }
                }
                previous = Some((relative, point));
            }
        }
        Ok(())
    }
}

fn collect_lines(geometry: RawGeometry, lines: &mut Vec<Vec<(f64, f64)>>) -> RenderResult<()> {
    let RawGeometry {
        kind,
        coordinates,
        geometries,
    } = geometry;

    match kind.as_str() {
        "LineString" => lines.push(to_line(parse::<Vec<Position>>(coordinates)?)?),
        "MultiLineString" | "Polygon" => {
            for part in parse::<Vec<Vec<Position>>>(coordinates)? {
                lines.push(to_line(part)?);
            }
        }
        "MultiPolygon" => {
            for polygon in parse::<Vec<Vec<Vec<Position>>>>(coordinates)? {
                for ring in polygon {
                    lines.push(to_line(ring)?);
                }
            }
        }
        "GeometryCollection" => {
            for inner in geometries {
                collect_lines(inner, lines)?;
            }
        }
        other => debug!(geometry = other, "Ignoring non-line geometry"),
    }
    Ok(())
}

fn parse<T: serde::de::DeserializeOwned>(coordinates: serde_json::Value) -> RenderResult<T> {
    serde_json::from_value(coordinates).map_err(|e| RenderError::Coastline(e.to_string()))
}

fn to_line(positions: Vec<Position>) -> RenderResult<Vec<(f64, f64)>> {
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] => Ok((*lon, clamp_pole(*lat))),
            _ => Err(RenderError::Coastline(format!(
                "position needs at least two values, got {:?}",
                p
            ))),
        })
        .collect()
}

fn clamp_pole(lat: f64) -> f64 {
    if lat.abs() > 90.0 && lat.abs() <= 90.0 + POLE_TOLERANCE {
        90.0f64.copysign(lat)
    } else {
        lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"scalerank": 1},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 5], [20, 0, 7]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiLineString", "coordinates": [[[0, 0], [1, 1]], [[5, 5], [6, 6]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [3, 3]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#;
        let coast = Coastlines::from_geojson(json).unwrap();
        assert_eq!(coast.len(), 3);
        assert_eq!(coast.vertex_count(), 7);
        assert_eq!(coast.lines()[0][2], (20.0, 0.0));
    }

    #[test]
    fn test_parse_bare_polygon() {
        let json = r#"{"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,0]]], [[[5,5],[6,5],[5,5]]]]}"#;
        let coast = Coastlines::from_geojson(json).unwrap();
        assert_eq!(coast.len(), 2);
    }

    #[test]
    fn test_pole_noise_is_clamped() {
        let json = r#"{"type": "LineString", "coordinates": [[0, -90.0000000001], [10, 90.0000004], [20, 91]]}"#;
        let coast = Coastlines::from_geojson(json).unwrap();
        assert_eq!(coast.lines()[0], vec![(0.0, -90.0), (10.0, 90.0), (20.0, 91.0)]);

        let polar = Coastlines::from_lines(vec![coast.lines()[0][..2].to_vec()]);
        let projection = Mollweide::new(0.0).unwrap();
        let ellipse = MapEllipse {
            cx: 50.0,
            cy: 25.0,
            rx: 40.0,
            ry: 20.0,
        };
        let mut canvas = RgbImage::new(100, 50);
        assert!(polar
            .draw(&mut canvas, &ellipse, &projection, Rgb([0, 0, 0]))
            .is_ok());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Coastlines::from_geojson("not json").is_err());
        assert!(Coastlines::from_geojson(r#"{"features": []}"#).is_err());
        assert!(Coastlines::from_geojson(r#"{"type": "LineString", "coordinates": [[1]]}"#).is_err());
    }
}

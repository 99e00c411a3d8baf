//! Rasterizing a lat/lon grid onto the projected globe.
//!
//! Every pixel inside the map ellipse is inverse-projected and colored from
//! the grid cell containing it. Cells span the midpoints between adjacent
//! coordinates, so each grid value paints a block rather than being
//! interpolated.

use image::RgbImage;
use projection::Mollweide;
use rayon::prelude::*;
use spin_common::LatLonGrid;

use crate::error::GeometryError;
use crate::gradient::ColorScale;
use crate::layout::MapEllipse;

/// Slack for float noise when deciding whether longitudes close the circle.
const WRAP_TOLERANCE: f64 = 1e-6;

/// Lookup from a geographic point to the grid cell containing it.
#[derive(Debug, Clone)]
pub struct CellIndex {
    /// Ascending latitude cell edges, one more than there are rows
    lat_edges: Vec<f64>,
    lat_descending: bool,
    /// Western edge of the first longitude cell
    lon_origin: f64,
    /// Cell edges as eastward offsets from `lon_origin`, starting at 0
    lon_edges: Vec<f64>,
}

impl CellIndex {
    /// Build the index from a grid's coordinates.
    ///
    /// Latitudes may run either way but must be strictly monotonic;
    /// longitudes must be strictly increasing and span less than 360°.
    pub fn new(lats: &[f64], lons: &[f64]) -> Result<Self, GeometryError> {
        check_finite("latitude", lats)?;
        check_finite("longitude", lons)?;

        let lat_descending = lats.len() > 1 && lats[1] < lats[0];
        let mut ascending = lats.to_vec();
        if lat_descending {
            ascending.reverse();
        }
        check_increasing("latitude", &ascending, lat_descending)?;
        check_increasing("longitude", lons, false)?;

        let lat_edges = cell_edges(&ascending)
            .map(|edges| edges.into_iter().map(|e| e.clamp(-90.0, 90.0)).collect())
            .unwrap_or_else(|| vec![-90.0, 90.0]);

        let (lon_origin, lon_edges) = match cell_edges(lons) {
            Some(edges) => {
                let span = lons[lons.len() - 1] - lons[0];
                if span >= 360.0 {
                    return Err(GeometryError::LongitudeSpan { span });
                }
                let origin = edges[0];
                let mut offsets: Vec<f64> = edges.iter().map(|e| e - origin).collect();
                if let Some(last) = offsets.last_mut() {
                    if *last >= 360.0 - WRAP_TOLERANCE {
                        *last = 360.0;
                    }
                }
                (origin, offsets)
            }
            // A single longitude column wraps the whole circle
            None => (lons[0] - 180.0, vec![0.0, 360.0]),
        };

        Ok(Self {
            lat_edges,
            lat_descending,
            lon_origin,
            lon_edges,
        })
    }

    pub fn rows(&self) -> usize {
        self.lat_edges.len() - 1
    }

    pub fn cols(&self) -> usize {
        self.lon_edges.len() - 1
    }

    /// Whether the longitude cells close the full circle.
    pub fn is_global(&self) -> bool {
        self.lon_edges.last().copied() == Some(360.0)
    }

    /// Grid (row, col) containing a point, or None outside the grid's coverage.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let row = self.lat_row(lat)?;
        let col = self.lon_col(lon)?;
        Some((row, col))
    }

    pub fn lat_row(&self, lat: f64) -> Option<usize> {
        let n = self.rows();
        if !(self.lat_edges[0]..=self.lat_edges[n]).contains(&lat) {
            return None;
        }
        let idx = bin_of(&self.lat_edges, lat);
        Some(if self.lat_descending { n - 1 - idx } else { idx })
    }

    pub fn lon_col(&self, lon: f64) -> Option<usize> {
        if !lon.is_finite() {
            return None;
        }
        let offset = (lon - self.lon_origin).rem_euclid(360.0);
        let n = self.cols();
        if offset > self.lon_edges[n] {
            return None;
        }
        Some(bin_of(&self.lon_edges, offset))
    }
}

fn check_finite(axis: &'static str, coords: &[f64]) -> Result<(), GeometryError> {
    if coords.is_empty() {
        return Err(GeometryError::EmptyAxis { axis });
    }
    match coords.iter().position(|c| !c.is_finite()) {
        Some(index) => Err(GeometryError::NonFiniteCoordinate { axis, index }),
        None => Ok(()),
    }
}

/// `reversed` maps the failing index back to the caller's order.
fn check_increasing(axis: &'static str, coords: &[f64], reversed: bool) -> Result<(), GeometryError> {
    match coords.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => {
            let index = if reversed { coords.len() - 1 - i } else { i + 1 };
            Err(GeometryError::NonMonotonic { axis, index })
        }
        None => Ok(()),
    }
}

/// Midpoint edges with half-spacing extrapolated at both ends.
fn cell_edges(centers: &[f64]) -> Option<Vec<f64>> {
    let n = centers.len();
    if n < 2 {
        return None;
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
    edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
    Some(edges)
}

/// Index of the bin `[edges[i], edges[i+1])` holding `value`; the last bin is closed.
fn bin_of(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    edges
        .partition_point(|&e| e <= value)
        .saturating_sub(1)
        .min(bins - 1)
}

/// Paint the grid onto `canvas` inside the map ellipse.
///
/// Pixels whose cell is NaN, or that fall outside the grid's coverage, get
/// the scale's missing color. Pixels outside the ellipse are left untouched.
pub fn render_globe(
    canvas: &mut RgbImage,
    ellipse: &MapEllipse,
    projection: &Mollweide,
    index: &CellIndex,
    grid: &LatLonGrid,
    scale: &ColorScale,
) {
    let width = canvas.width() as usize;
    let rows = ellipse.rows(canvas.height());
    let missing = scale.missing_color();

    canvas
        .par_chunks_mut(width * 3)
        .enumerate()
        .skip(rows.start as usize)
        .take(rows.len())
        .for_each(|(py, row)| {
            for (px, pixel) in row.chunks_exact_mut(3).enumerate() {
                let (x, y) = ellipse.to_map(px as f64 + 0.5, py as f64 + 0.5, projection);
                let Some((lon, lat)) = projection.inverse(x, y) else {
                    continue;
                };

                let color = match index.locate(lon, lat) {
                    Some((r, c)) => grid.get(r, c).map_or(missing, |v| scale.color_for(v)),
                    None => missing,
                };
                pixel[0] = color.r;
                pixel[1] = color.g;
                pixel[2] = color.b;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noaa_axes() -> (Vec<f64>, Vec<f64>) {
        let lats = (0..36).map(|i| -87.5 + 5.0 * i as f64).collect();
        let lons = (0..72).map(|i| 2.5 + 5.0 * i as f64).collect();
        (lats, lons)
    }

    #[test]
    fn test_noaa_grid_is_global() {
        let (lats, lons) = noaa_axes();
        let index = CellIndex::new(&lats, &lons).unwrap();
        assert_eq!((index.rows(), index.cols()), (36, 72));
        assert!(index.is_global());

        assert_eq!(index.locate(2.4, -87.6), Some((0, 0)));
        assert_eq!(index.locate(-2.4, 89.9), Some((35, 71)));
        assert_eq!(index.locate(-180.0, 0.1), Some((18, 36)));
        assert_eq!(index.locate(180.0, 90.0), Some((35, 36)));
    }

    #[test]
    fn test_descending_latitudes() {
        let lats = [60.0, 30.0, 0.0, -30.0];
        let lons = [0.0, 90.0, 180.0, 270.0];
        let index = CellIndex::new(&lats, &lons).unwrap();

        assert_eq!(index.lat_row(59.0), Some(0));
        assert_eq!(index.lat_row(-40.0), Some(3));
        assert_eq!(index.lat_row(80.0), None);
        assert_eq!(index.lat_row(-50.0), None);
    }

    #[test]
    fn test_regional_longitudes_do_not_wrap() {
        let lats = [0.0, 10.0];
        let lons = [-10.0, 0.0, 10.0];
        let index = CellIndex::new(&lats, &lons).unwrap();
        assert!(!index.is_global());
        assert_eq!(index.lon_col(-14.0), Some(0));
        assert_eq!(index.lon_col(14.0), Some(2));
        assert_eq!(index.lon_col(16.0), None);
        assert_eq!(index.lon_col(180.0), None);
    }

    #[test]
    fn test_single_cell_covers_globe() {
        let index = CellIndex::new(&[0.0], &[0.0]).unwrap();
        assert_eq!(index.locate(-179.9, -89.0), Some((0, 0)));
        assert_eq!(index.locate(179.9, 89.0), Some((0, 0)));
    }

    #[test]
    fn test_invalid_coordinates() {
        assert_eq!(
            CellIndex::new(&[], &[0.0]).unwrap_err(),
            GeometryError::EmptyAxis { axis: "latitude" }
        );
        assert_eq!(
            CellIndex::new(&[0.0, f64::NAN], &[0.0]).unwrap_err(),
            GeometryError::NonFiniteCoordinate {
                axis: "latitude",
                index: 1
            }
        );
        assert_eq!(
            CellIndex::new(&[0.0], &[0.0, 10.0, 10.0]).unwrap_err(),
            GeometryError::NonMonotonic {
                axis: "longitude",
                index: 2
            }
        );
        assert_eq!(
            CellIndex::new(&[30.0, 0.0, 10.0], &[0.0]).unwrap_err(),
            GeometryError::NonMonotonic {
                axis: "latitude",
                index: 2
            }
        );
        assert!(matches!(
            CellIndex::new(&[0.0], &[-180.0, 0.0, 180.0]),
            Err(GeometryError::LongitudeSpan { .. })
        ));
    }
}

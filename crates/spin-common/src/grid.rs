//! Regular latitude/longitude grids holding one scalar per cell.

use crate::error::{GridError, GridResult};

/// A 2D field on a regular lat/lon grid.
///
/// Values are stored row-major: one row per latitude, one column per
/// longitude, in the order the coordinates are given. Missing cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonGrid {
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<f32>,
}

impl LatLonGrid {
    /// Create a grid, checking that `values` covers every lat/lon pair.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, values: Vec<f32>) -> GridResult<Self> {
        if lats.is_empty() {
            return Err(GridError::EmptyAxis("latitude"));
        }
        if lons.is_empty() {
            return Err(GridError::EmptyAxis("longitude"));
        }

        let expected = lats.len() * lons.len();
        if values.len() != expected {
            return Err(GridError::ShapeMismatch {
                rows: lats.len(),
                cols: lons.len(),
                expected,
                actual: values.len(),
            });
        }

        Ok(Self { lats, lons, values })
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(lats: Vec<f64>, lons: Vec<f64>, value: f32) -> GridResult<Self> {
        let len = lats.len() * lons.len();
        Self::new(lats, lons, vec![value; len])
    }

    /// Cell-wise mean of several grids with identical coordinates.
    ///
    /// NaN cells are skipped; a cell that is NaN in every input stays NaN.
    pub fn nan_mean(grids: &[LatLonGrid]) -> GridResult<Self> {
        let first = grids.first().ok_or(GridError::NothingToAverage)?;
        if grids.len() == 1 {
            return Ok(first.clone());
        }

        let mut sums = vec![0.0f64; first.values.len()];
        let mut counts = vec![0u32; first.values.len()];

        for grid in grids {
            if grid.lats.len() != first.lats.len() || grid.lons.len() != first.lons.len() {
                return Err(GridError::ShapeMismatch {
                    rows: first.lats.len(),
                    cols: first.lons.len(),
                    expected: first.values.len(),
                    actual: grid.values.len(),
                });
            }
            for (idx, &value) in grid.values.iter().enumerate() {
                if !value.is_nan() {
                    sums[idx] += value as f64;
                    counts[idx] += 1;
                }
            }
        }

        let values = sums
            .iter()
            .zip(&counts)
            .map(|(&sum, &count)| {
                if count == 0 {
                    f32::NAN
                } else {
                    (sum / count as f64) as f32
                }
            })
            .collect();

        Self::new(first.lats.clone(), first.lons.clone(), values)
    }

    /// Latitude coordinates, one per row.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitude coordinates, one per column.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Row-major cell values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of columns (longitudes).
    pub fn width(&self) -> usize {
        self.lons.len()
    }

    /// Number of rows (latitudes).
    pub fn height(&self) -> usize {
        self.lats.len()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at (row, col), or None when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.values.get(row * self.width() + col).copied()
    }

    /// Minimum and maximum of the non-NaN cells.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }

    /// Unweighted mean of the non-NaN cells.
    pub fn valid_mean(&self) -> Option<f32> {
        let (sum, count) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0f64, 0usize), |(sum, count), &v| (sum + v as f64, count + 1));

        if count == 0 {
            None
        } else {
            Some((sum / count as f64) as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: Vec<f32>) -> LatLonGrid {
        LatLonGrid::new(vec![-45.0, 45.0], vec![0.0, 120.0, 240.0], values).unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = LatLonGrid::new(vec![0.0, 1.0], vec![0.0], vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            GridError::ShapeMismatch {
                rows: 2,
                cols: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_empty_axis_rejected() {
        let err = LatLonGrid::new(vec![], vec![0.0], vec![]).unwrap_err();
        assert_eq!(err, GridError::EmptyAxis("latitude"));
    }

    #[test]
    fn test_get_row_major() {
        let g = grid(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(g.get(0, 2), Some(2.0));
        assert_eq!(g.get(1, 0), Some(3.0));
        assert_eq!(g.get(2, 0), None);
    }

    #[test]
    fn test_nan_mean_skips_missing() {
        let a = grid(vec![1.0, f32::NAN, 3.0, f32::NAN, 0.0, 0.0]);
        let b = grid(vec![3.0, 2.0, f32::NAN, f32::NAN, 1.0, -1.0]);
        let mean = LatLonGrid::nan_mean(&[a, b]).unwrap();

        assert_eq!(mean.get(0, 0), Some(2.0));
        assert_eq!(mean.get(0, 1), Some(2.0));
        assert_eq!(mean.get(0, 2), Some(3.0));
        assert!(mean.get(1, 0).unwrap().is_nan());
        assert_eq!(mean.get(1, 1), Some(0.5));
        assert_eq!(mean.get(1, 2), Some(-0.5));
    }

    #[test]
    fn test_nan_mean_of_nothing() {
        assert_eq!(LatLonGrid::nan_mean(&[]), Err(GridError::NothingToAverage));
    }

    #[test]
    fn test_value_range_and_mean() {
        let g = grid(vec![-2.0, f32::NAN, 1.0, 4.0, f32::NAN, 0.0]);
        assert_eq!(g.value_range(), Some((-2.0, 4.0)));
        assert_eq!(g.valid_mean(), Some(0.75));

        let empty = LatLonGrid::filled(vec![0.0], vec![0.0], f32::NAN).unwrap();
        assert_eq!(empty.value_range(), None);
        assert_eq!(empty.valid_mean(), None);
    }
}

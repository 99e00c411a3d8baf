//! Test data generators for creating synthetic anomaly data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use chrono::{NaiveDate, NaiveDateTime};
use spin_common::LatLonGrid;

/// Creates an anomaly-like grid with values in roughly [-1.5, 1.5] plus `offset`.
///
/// Each cell value is `offset + (row / height - 0.5) * 2 + (col / width) * 0.5`,
/// so two grids made with different offsets differ by exactly the offset
/// difference in every cell.
///
/// # Example
///
/// ```
/// use test_utils::create_anomaly_grid;
///
/// let grid = create_anomaly_grid(4, 2, 1.0);
/// assert_eq!(grid.len(), 8);
/// assert_eq!(grid[0], 0.0);  // 1.0 - 1.0 + 0.0
/// assert_eq!(grid[1], 0.125); // 1.0 - 1.0 + 0.125
/// ```
pub fn create_anomaly_grid(width: usize, height: usize, offset: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let lat_factor = (row as f32 / height.max(1) as f32 - 0.5) * 2.0;
            let lon_factor = col as f32 / width.max(1) as f32 * 0.5;
            data.push(offset + lat_factor + lon_factor);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at specified positions.
///
/// Useful for testing missing data handling.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `nan_positions` - List of (col, row) positions that should be NaN
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Cell-center latitudes of a global grid with `n` rows, south to north.
///
/// `global_lats(36)` gives the 5° NOAAGlobalTemp axis: -87.5, -82.5, ..., 87.5.
pub fn global_lats(n: usize) -> Vec<f64> {
    let step = 180.0 / n as f64;
    (0..n).map(|i| -90.0 + step * (i as f64 + 0.5)).collect()
}

/// Cell-center longitudes of a global grid with `n` columns, 0..360.
///
/// `global_lons(72)` gives 2.5, 7.5, ..., 357.5.
pub fn global_lons(n: usize) -> Vec<f64> {
    let step = 360.0 / n as f64;
    (0..n).map(|i| step * (i as f64 + 0.5)).collect()
}

/// A global `LatLonGrid` with every cell set to `value`.
pub fn constant_anomaly_grid(nlat: usize, nlon: usize, value: f32) -> LatLonGrid {
    LatLonGrid::filled(global_lats(nlat), global_lons(nlon), value)
        .expect("generated axes are non-empty")
}

/// Midnight on the first day of each month, starting at `year`-`month`.
pub fn monthly_times(year: i32, month: u32, count: usize) -> Vec<NaiveDateTime> {
    (0..count)
        .map(|i| {
            let ordinal = year * 12 + (month as i32 - 1) + i as i32;
            NaiveDate::from_ymd_opt(ordinal.div_euclid(12), ordinal.rem_euclid(12) as u32 + 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid calendar month")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_anomaly_grid_offsets() {
        let a = create_anomaly_grid(5, 3, 0.0);
        let b = create_anomaly_grid(5, 3, 2.0);
        for (x, y) in a.iter().zip(&b) {
            crate::assert_approx_eq!(y - x, 2.0, 1e-6);
        }
    }

    #[test]
    fn test_noaa_axes() {
        let lats = global_lats(36);
        let lons = global_lons(72);
        assert_eq!(lats.len(), 36);
        assert_eq!(lats[0], -87.5);
        assert_eq!(lats[35], 87.5);
        assert_eq!(lons[0], 2.5);
        assert_eq!(lons[71], 357.5);
    }

    #[test]
    fn test_grid_with_nans() {
        let grid = create_grid_with_nans(3, 2, &[(1, 1), (9, 9)]);
        assert!(grid[4].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn test_monthly_times_cross_year() {
        let times = monthly_times(2000, 11, 3);
        let months: Vec<(i32, u32)> = times.iter().map(|t| (t.year(), t.month())).collect();
        assert_eq!(months, vec![(2000, 11), (2000, 12), (2001, 1)]);
    }
}

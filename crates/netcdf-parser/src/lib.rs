//! NetCDF parser for gridded temperature-anomaly time series.
//!
//! This crate reads a single anomaly variable (e.g. `anom` from NOAAGlobalTemp)
//! together with its `time`, `lat` and `lon` coordinates into memory, and
//! reduces it to monthly 2D fields.
//!
//! # Data Layout
//!
//! The variable must be laid out as `(time, [singleton dims...], lat, lon)`.
//! NOAAGlobalTemp v5 stores `anom(time, z, lat, lon)` with a single `z`
//! level; such length-1 dimensions are squeezed away. Packed values are
//! unpacked with `scale_factor`/`add_offset`, and `_FillValue` /
//! `missing_value` cells become NaN.
//!
//! # Time Axis
//!
//! Timestamps are decoded from CF units (`days since 1800-01-01 00:00:00`)
//! on the proleptic Gregorian calendar.

pub mod error;
pub mod native;

use std::path::Path;

use chrono::NaiveDateTime;
use spin_common::{LatLonGrid, YearMonth};
use tracing::debug;

pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;

/// Default name of the anomaly variable in NOAAGlobalTemp files.
pub const DEFAULT_VARIABLE: &str = "anom";

/// An in-memory anomaly time series on a regular lat/lon grid.
///
/// Values are time-major: `values[t * nlat * nlon + row * nlon + col]`.
#[derive(Debug, Clone)]
pub struct AnomalyDataset {
    variable: String,
    units: Option<String>,
    times: Vec<NaiveDateTime>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<f32>,
}

impl AnomalyDataset {
    /// Open a NetCDF file and read `variable` with its coordinates.
    pub fn open<P: AsRef<Path>>(path: P, variable: &str) -> NetCdfResult<Self> {
        native::read_anomaly_dataset(path.as_ref(), variable)
    }

    /// Assemble a dataset from already-decoded parts.
    pub fn from_parts(
        variable: impl Into<String>,
        times: Vec<NaiveDateTime>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<f32>,
    ) -> NetCdfResult<Self> {
        if times.is_empty() {
            return Err(NetCdfError::MissingData("time steps".to_string()));
        }
        if lats.is_empty() || lons.is_empty() {
            return Err(NetCdfError::MissingData("lat/lon coordinates".to_string()));
        }

        let expected = times.len() * lats.len() * lons.len();
        if values.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "expected {} values ({} x {} x {}), got {}",
                expected,
                times.len(),
                lats.len(),
                lons.len(),
                values.len()
            )));
        }

        Ok(Self {
            variable: variable.into(),
            units: None,
            times,
            lats,
            lons,
            values,
        })
    }

    /// Attach the variable's physical units (e.g. "degree C").
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Number of time steps.
    pub fn len_time(&self) -> usize {
        self.times.len()
    }

    /// First and last timestamp.
    pub fn time_coverage(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// The 2D field at one time index.
    pub fn time_slice(&self, index: usize) -> Option<LatLonGrid> {
        let cells = self.lats.len() * self.lons.len();
        let start = index.checked_mul(cells)?;
        let slice = self.values.get(start..start + cells)?;
        LatLonGrid::new(self.lats.clone(), self.lons.clone(), slice.to_vec()).ok()
    }

    /// Time indices whose timestamp falls in the given calendar month.
    pub fn indices_for(&self, period: YearMonth) -> Vec<usize> {
        self.times
            .iter()
            .enumerate()
            .filter(|(_, t)| period.contains(t))
            .map(|(i, _)| i)
            .collect()
    }

    /// Mean field over every time step in `period`, skipping missing cells.
    ///
    /// Monthly products normally hold exactly one record per month, in which
    /// case this is that record unchanged.
    pub fn monthly_mean(&self, period: YearMonth) -> NetCdfResult<LatLonGrid> {
        let indices = self.indices_for(period);
        if indices.is_empty() {
            return Err(NetCdfError::NoDataForPeriod(period));
        }

        let slices = indices
            .iter()
            .filter_map(|&i| self.time_slice(i))
            .collect::<Vec<_>>();

        debug!(
            period = %period,
            records = slices.len(),
            variable = %self.variable,
            "Averaging monthly slice"
        );

        Ok(LatLonGrid::nan_mean(&slices)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn dataset() -> AnomalyDataset {
        // 2x2 grid, three records: Jan, mid-Jan, Feb
        AnomalyDataset::from_parts(
            "anom",
            vec![ts(2000, 1, 1), ts(2000, 1, 16), ts(2000, 2, 1)],
            vec![-45.0, 45.0],
            vec![90.0, 270.0],
            vec![
                1.0, 2.0, 3.0, f32::NAN, //
                3.0, 2.0, f32::NAN, f32::NAN, //
                -1.0, -1.0, -1.0, -1.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_parts_rejects_bad_shape() {
        let err = AnomalyDataset::from_parts("anom", vec![ts(2000, 1, 1)], vec![0.0], vec![0.0], vec![])
            .unwrap_err();
        assert!(matches!(err, NetCdfError::InvalidFormat(_)));
    }

    #[test]
    fn test_indices_for_month() {
        let ds = dataset();
        assert_eq!(ds.indices_for(YearMonth::new(2000, 1).unwrap()), vec![0, 1]);
        assert_eq!(ds.indices_for(YearMonth::new(2000, 2).unwrap()), vec![2]);
        assert!(ds.indices_for(YearMonth::new(2000, 3).unwrap()).is_empty());
    }

    #[test]
    fn test_monthly_mean_averages_records() {
        let ds = dataset();
        let jan = ds.monthly_mean(YearMonth::new(2000, 1).unwrap()).unwrap();
        assert_eq!(&jan.values()[..3], &[2.0, 2.0, 3.0]);
        assert!(jan.values()[3].is_nan());
    }

    #[test]
    fn test_monthly_mean_single_record_unchanged() {
        let ds = dataset();
        let feb = ds.monthly_mean(YearMonth::new(2000, 2).unwrap()).unwrap();
        assert_eq!(feb.values(), &[-1.0, -1.0, -1.0, -1.0]);
        assert_eq!(feb.lats(), ds.lats());
        assert_eq!(feb.lons(), ds.lons());
    }

    #[test]
    fn test_monthly_mean_missing_period() {
        let ds = dataset();
        let err = ds.monthly_mean(YearMonth::new(1999, 12).unwrap()).unwrap_err();
        assert!(matches!(err, NetCdfError::NoDataForPeriod(p) if p.year == 1999 && p.month == 12));
    }

    #[test]
    fn test_time_coverage() {
        let ds = dataset();
        assert_eq!(ds.time_coverage(), Some((ts(2000, 1, 1), ts(2000, 2, 1))));
        assert!(ds.time_slice(3).is_none());
    }
}

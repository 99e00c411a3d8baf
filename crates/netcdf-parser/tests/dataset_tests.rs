//! Tests for reading anomaly datasets from NetCDF files on disk.

use std::path::Path;

use chrono::NaiveDate;
use netcdf_parser::{AnomalyDataset, NetCdfError};
use spin_common::YearMonth;
use test_utils::{
    assert_approx_eq, create_anomaly_grid, create_constant_grid, create_grid_with_nans,
    global_lats, global_lons, require_test_file, temp_test_dir,
};

const MISSING: f32 = -999.9;

/// Write a small NOAAGlobalTemp-shaped file: anom(time, z, lat, lon).
fn write_fixture(path: &Path, months: usize, lats: &[f32], lons: &[f32]) {
    let mut file = netcdf::create(path).unwrap();
    file.add_attribute("title", "synthetic anomaly fixture").unwrap();

    file.add_dimension("time", months).unwrap();
    file.add_dimension("z", 1).unwrap();
    file.add_dimension("lat", lats.len()).unwrap();
    file.add_dimension("lon", lons.len()).unwrap();

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"]).unwrap();
        time_var
            .put_attribute("units", "days since 1800-01-01 00:00:00")
            .unwrap();
        // 2000-01-01, 2000-02-01, 2000-03-01 ...
        let starts = [73048.0, 73079.0, 73108.0, 73139.0];
        time_var.put_values(&starts[..months], ..).unwrap();
    }
    {
        let mut z_var = file.add_variable::<f32>("z", &["z"]).unwrap();
        z_var.put_values(&[0.0f32], ..).unwrap();
    }
    {
        let mut lat_var = file.add_variable::<f32>("lat", &["lat"]).unwrap();
        lat_var.put_attribute("units", "degrees_north").unwrap();
        lat_var.put_values(lats, ..).unwrap();
    }
    {
        let mut lon_var = file.add_variable::<f32>("lon", &["lon"]).unwrap();
        lon_var.put_attribute("units", "degrees_east").unwrap();
        lon_var.put_values(lons, ..).unwrap();
    }
    {
        let mut anom = file
            .add_variable::<f32>("anom", &["time", "z", "lat", "lon"])
            .unwrap();
        anom.put_attribute("units", "degree C").unwrap();
        anom.put_attribute("missing_value", MISSING).unwrap();

        let mut data = Vec::new();
        for month in 0..months {
            let mut grid = create_anomaly_grid(lons.len(), lats.len(), month as f32);
            grid[0] = MISSING;
            data.extend(grid);
        }
        anom.put_values(&data, ..).unwrap();
    }
}

#[test]
fn test_open_noaa_layout() {
    let dir = temp_test_dir();
    let path = dir.path().join("anom.nc");
    let lats = [-60.0f32, -20.0, 20.0, 60.0];
    let lons = [2.5f32, 92.5, 182.5, 272.5];
    write_fixture(&path, 3, &lats, &lons);

    let ds = AnomalyDataset::open(&path, "anom").unwrap();

    assert_eq!(ds.len_time(), 3);
    assert_eq!(ds.lats(), &[-60.0, -20.0, 20.0, 60.0]);
    assert_eq!(ds.lons(), &[2.5, 92.5, 182.5, 272.5]);
    assert_eq!(ds.units(), Some("degree C"));

    let (first, last) = ds.time_coverage().unwrap();
    assert_eq!(YearMonth::from(first.date()), YearMonth::new(2000, 1).unwrap());
    assert_eq!(YearMonth::from(last.date()), YearMonth::new(2000, 3).unwrap());
}

#[test]
fn test_missing_values_become_nan() {
    let dir = temp_test_dir();
    let path = dir.path().join("anom.nc");
    write_fixture(&path, 2, &[-45.0, 45.0], &[90.0, 270.0]);

    let ds = AnomalyDataset::open(&path, "anom").unwrap();
    let feb = ds.monthly_mean(YearMonth::new(2000, 2).unwrap()).unwrap();

    assert!(feb.values()[0].is_nan());
    assert!(feb.values()[1..].iter().all(|v| v.is_finite()));
}

#[test]
fn test_monthly_values_follow_offsets() {
    let dir = temp_test_dir();
    let path = dir.path().join("anom.nc");
    write_fixture(&path, 3, &[-45.0, 45.0], &[90.0, 270.0]);

    let ds = AnomalyDataset::open(&path, "anom").unwrap();
    let jan = ds.monthly_mean(YearMonth::new(2000, 1).unwrap()).unwrap();
    let mar = ds.monthly_mean(YearMonth::new(2000, 3).unwrap()).unwrap();

    // Same pattern shifted by the month offset
    for (a, b) in jan.values().iter().zip(mar.values()).skip(1) {
        assert_approx_eq!(b - a, 2.0, 1e-5);
    }
}

#[test]
fn test_unknown_variable() {
    let dir = temp_test_dir();
    let path = dir.path().join("anom.nc");
    write_fixture(&path, 1, &[0.0], &[0.0]);

    let err = AnomalyDataset::open(&path, "sst").unwrap_err();
    assert!(matches!(err, NetCdfError::MissingData(_)));
}

#[test]
fn test_not_a_netcdf_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("garbage.nc");
    std::fs::write(&path, b"this is not netcdf").unwrap();

    let err = AnomalyDataset::open(&path, "anom").unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(_)));
}

#[test]
fn test_two_records_in_one_month_are_averaged() {
    let (nlat, nlon) = (2, 4);
    let mid_jan = NaiveDate::from_ymd_opt(2000, 1, 16)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let jan = NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let mut values = create_grid_with_nans(nlon, nlat, &[(0, 0)]);
    values.extend(create_constant_grid(nlon, nlat, 1.0));

    let ds = AnomalyDataset::from_parts(
        "anom",
        vec![jan, mid_jan],
        global_lats(nlat),
        global_lons(nlon),
        values,
    )
    .unwrap();
    let mean = ds.monthly_mean(YearMonth::new(2000, 1).unwrap()).unwrap();

    // A cell missing from one record takes the other record's value
    assert_approx_eq!(mean.values()[0], 1.0, 1e-6);
    for &v in &mean.values()[1..] {
        assert_approx_eq!(v, 0.5, 1e-6);
    }
}

// ============================================================================
// Real NOAAGlobalTemp file (skipped unless downloaded)
// ============================================================================

#[test]
fn test_real_noaa_global_temp() {
    let path = require_test_file!(
        "NOAAGlobalTemp_v5.0.0_gridded_s188001_e202212_c20230108T133308.nc"
    );

    let ds = AnomalyDataset::open(&path, "anom").unwrap();
    assert_eq!(ds.lats().len(), 36);
    assert_eq!(ds.lons().len(), 72);
    assert_approx_eq!(ds.lats()[0], -87.5, 1e-4);
    assert_approx_eq!(ds.lons()[0], 2.5, 1e-4);

    let (first, last) = ds.time_coverage().unwrap();
    assert_eq!(YearMonth::from(first.date()), YearMonth::new(1880, 1).unwrap());
    assert_eq!(YearMonth::from(last.date()), YearMonth::new(2022, 12).unwrap());

    for year in [2000, 2020] {
        for month in [1, 12] {
            let grid = ds.monthly_mean(YearMonth::new(year, month).unwrap()).unwrap();
            let finite: Vec<f32> = grid.values().iter().copied().filter(|v| v.is_finite()).collect();
            assert!(!finite.is_empty(), "{}-{:02} has no data", year, month);
            assert!(finite.iter().all(|v| v.abs() < 30.0));
        }
    }
}

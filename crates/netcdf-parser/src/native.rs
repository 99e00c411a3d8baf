//! Native NetCDF parsing using the netcdf library.
//!
//! The netcdf library wraps libnetcdf/HDF5 and needs a file path, so remote
//! datasets are downloaded to disk before they reach this module.

use std::path::Path;
use std::sync::Once;

use chrono::NaiveDateTime;
use spin_common::CfTimeUnits;
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::AnomalyDataset;

const TIME_NAMES: [&str; 2] = ["time", "Time"];
const LAT_NAMES: [&str; 3] = ["lat", "latitude", "LAT"];
const LON_NAMES: [&str; 3] = ["lon", "longitude", "LON"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by
/// calling H5Eset_auto2 with null handlers. It only needs to be called once
/// per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read an anomaly variable and its coordinates from a NetCDF file.
pub fn read_anomaly_dataset(path: &Path, variable: &str) -> NetCdfResult<AnomalyDataset> {
    silence_hdf5_errors();

    let nc_file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let time_name = find_variable(&nc_file, &TIME_NAMES, "time")?;
    let lat_name = find_variable(&nc_file, &LAT_NAMES, "latitude")?;
    let lon_name = find_variable(&nc_file, &LON_NAMES, "longitude")?;

    let times = read_times(&nc_file, time_name)?;
    let lats = read_coordinate(&nc_file, lat_name)?;
    let lons = read_coordinate(&nc_file, lon_name)?;

    let var = nc_file
        .variable(variable)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", variable)))?;

    let dims: Vec<(String, usize)> = var
        .dimensions()
        .iter()
        .map(|d| (d.name(), d.len()))
        .collect();
    check_layout(&dims, time_name, lat_name, lon_name)?;

    let raw: Vec<f32> = var
        .get_values::<f32, _>(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", variable, e)))?;

    let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f32_attr(&var, "_FillValue");
    let missing_value = get_f32_attr(&var, "missing_value");
    let units = get_string_attr(&var, "units");

    let values = unpack_values(&raw, scale_factor, add_offset, fill_value, missing_value);

    info!(
        path = %path.display(),
        variable = variable,
        time_steps = times.len(),
        lat = lats.len(),
        lon = lons.len(),
        "Loaded anomaly dataset"
    );

    let dataset = AnomalyDataset::from_parts(variable, times, lats, lons, values)?;
    Ok(match units {
        Some(units) => dataset.with_units(units),
        None => dataset,
    })
}

/// Apply packing attributes and map fill/missing markers to NaN.
pub fn unpack_values(
    raw: &[f32],
    scale_factor: f32,
    add_offset: f32,
    fill_value: Option<f32>,
    missing_value: Option<f32>,
) -> Vec<f32> {
    raw.iter()
        .map(|&val| {
            if !val.is_finite()
                || val.abs() > 1.0e30
                || Some(val) == fill_value
                || Some(val) == missing_value
            {
                f32::NAN
            } else {
                val * scale_factor + add_offset
            }
        })
        .collect()
}

/// Verify the variable is `(time, [len-1 dims...], lat, lon)`.
fn check_layout(
    dims: &[(String, usize)],
    time_name: &str,
    lat_name: &str,
    lon_name: &str,
) -> NetCdfResult<()> {
    let names: Vec<&str> = dims.iter().map(|(n, _)| n.as_str()).collect();
    if dims.len() < 3
        || names[0] != time_name
        || names[dims.len() - 2] != lat_name
        || names[dims.len() - 1] != lon_name
    {
        return Err(NetCdfError::InvalidFormat(format!(
            "expected dimensions ({}, ..., {}, {}), found ({})",
            time_name,
            lat_name,
            lon_name,
            names.join(", ")
        )));
    }

    for (name, len) in &dims[1..dims.len() - 2] {
        if *len != 1 {
            return Err(NetCdfError::InvalidFormat(format!(
                "dimension {} has length {}; only singleton extra dimensions are supported",
                name, len
            )));
        }
        debug!(dimension = %name, "Squeezing singleton dimension");
    }

    Ok(())
}

fn find_variable<'a>(
    file: &netcdf::File,
    names: &[&'a str],
    what: &str,
) -> NetCdfResult<&'a str> {
    names
        .iter()
        .copied()
        .find(|name| file.variable(name).is_some())
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate", what)))
}

fn read_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
}

fn read_times(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<NaiveDateTime>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;

    let units = get_string_attr(&var, "units")
        .ok_or_else(|| NetCdfError::MissingData(format!("{} units attribute", name)))?;
    let cf_units = CfTimeUnits::parse(&units)?;

    let raw = read_coordinate(file, name)?;
    raw.iter()
        .map(|&offset| {
            cf_units.decode(offset).ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("time value {} out of range", offset))
            })
        })
        .collect()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(names: &[(&str, usize)]) -> Vec<(String, usize)> {
        names.iter().map(|(n, l)| (n.to_string(), *l)).collect()
    }

    #[test]
    fn test_unpack_values() {
        let raw = [10.0, -999.0, 20.0, f32::INFINITY, 9.96921e36, -9999.0];
        let values = unpack_values(&raw, 0.1, 1.0, Some(-999.0), Some(-9999.0));

        assert_eq!(values[0], 2.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
        assert!(values[3].is_nan());
        assert!(values[4].is_nan());
        assert!(values[5].is_nan());
    }

    #[test]
    fn test_layout_with_singleton_level() {
        let d = dims(&[("time", 12), ("z", 1), ("lat", 36), ("lon", 72)]);
        assert!(check_layout(&d, "time", "lat", "lon").is_ok());
    }

    #[test]
    fn test_layout_rejects_real_level() {
        let d = dims(&[("time", 12), ("level", 3), ("lat", 36), ("lon", 72)]);
        assert!(matches!(
            check_layout(&d, "time", "lat", "lon"),
            Err(NetCdfError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_layout_rejects_transposed() {
        let d = dims(&[("time", 12), ("lon", 72), ("lat", 36)]);
        assert!(check_layout(&d, "time", "lat", "lon").is_err());

        let d = dims(&[("lat", 36), ("lon", 72)]);
        assert!(check_layout(&d, "time", "lat", "lon").is_err());
    }
}

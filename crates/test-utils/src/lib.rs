//! Shared test utilities for the anomaly-spin workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for optional test data and external programs
//! - Synthetic anomaly grid generators
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{require_program, create_anomaly_grid};
//! ```

pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// This is useful for tests that depend on external data files that may not
/// be present in all environments (e.g., CI without the full NOAA dataset).
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_real_dataset() {
///     let path = require_test_file!("NOAAGlobalTemp_sample.nc");
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro to skip a test if an external program is not on `PATH`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_program;
///
/// #[test]
/// fn test_encode_with_ffmpeg() {
///     require_program!("ffmpeg");
///     // Test code spawning ffmpeg...
/// }
/// ```
#[macro_export]
macro_rules! require_program {
    ($name:expr) => {{
        if !$crate::program_available($name) {
            eprintln!("SKIPPED: '{}' is not installed or not on PATH.", $name);
            return;
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_require_program_skips_missing() {
        let mut reached = false;
        let mut body = || {
            require_program!("definitely-not-a-real-program-4f2a");
            reached = true;
        };
        body();
        assert!(!reached);
    }
}

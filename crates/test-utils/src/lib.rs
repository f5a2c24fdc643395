//! Shared test utilities for the thermal-indexer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Grid data generators for surface fields
//! - Fixtures describing a complete surface batch
//! - Approximate floating-point assertions
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
//! use test_utils::{assert_approx_eq, fixtures, temperature_grid};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(273.1501, 273.15, 0.001); // passes
/// assert_approx_eq!(f64::NAN, 0.0, 1.0);      // fails: NaN never matches
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Element-wise approximate equality of two grids.
///
/// ```ignore
/// use test_utils::assert_grid_approx_eq;
///
/// assert_grid_approx_eq!(&[1.0, 2.0], &[1.0001, 2.0], 0.001);
/// ```
#[macro_export]
macro_rules! assert_grid_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        assert_eq!(left.len(), right.len(), "grid lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let diff = (l - r).abs();
            if !(diff <= $epsilon as f64) {
                panic!(
                    "grids differ at index {}: left `{:?}`, right `{:?}`, diff `{:?}`",
                    i, l, r, diff
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_within_tolerance() {
        assert_approx_eq!(273.1501, 273.15, 0.001);
        assert_approx_eq!(-60.0, -60.000001, 0.0001);
        assert_approx_eq!(300.0_f32, 300.0_f64, 0.0);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_outside_tolerance() {
        assert_approx_eq!(288.2, 288.15, 0.01);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }

    #[test]
    fn test_assert_grid_approx_eq_passes() {
        assert_grid_approx_eq!(&[1.0, 2.0], &[1.0001, 2.0], 0.001);
    }

    #[test]
    #[should_panic(expected = "grids differ at index 1")]
    fn test_assert_grid_approx_eq_reports_index() {
        assert_grid_approx_eq!(&[1.0, 2.0], &[1.0, 2.5], 0.001);
    }
}

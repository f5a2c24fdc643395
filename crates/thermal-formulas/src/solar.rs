//! Solar zenith angle.
//!
//! Declination and equation of time use the Fourier approximation in the
//! fractional year. The integral over an interval is evaluated with
//! three-point Gauss-Legendre quadrature on sub-intervals of at most one hour.

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::trace;

use crate::error::{check_lengths, FormulaError, Result};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Gauss-Legendre nodes and weights on [-1, 1].
const GAUSS_NODES: [f64; 3] = [-0.774_596_669_241_483_4, 0.0, 0.774_596_669_241_483_4];
const GAUSS_WEIGHTS: [f64; 3] = [5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0];

/// Solar declination and time correction, both in degrees, for a day of
/// year and an hour of that day (UTC).
fn solar_position(day_of_year: f64, hour: f64) -> (f64, f64) {
    let g = (360.0 / 365.25 * (day_of_year + hour / 24.0)).to_radians();

    let declination = 0.396372 - 22.91327 * g.cos() + 4.02543 * g.sin()
        - 0.387205 * (2.0 * g).cos()
        + 0.051967 * (2.0 * g).sin()
        - 0.154527 * (3.0 * g).cos()
        + 0.084798 * (3.0 * g).sin();

    let time_correction = 0.004297 + 0.107029 * g.cos() - 1.837877 * g.sin()
        - 0.837378 * (2.0 * g).cos()
        - 2.340475 * (2.0 * g).sin();

    (declination, time_correction)
}

/// Cosine of the solar zenith angle, clipped to [0, 1].
///
/// `hour` may exceed 24; it is folded onto the following days.
pub fn cos_solar_zenith_angle(day_of_year: f64, hour: f64, lat: f64, lon: f64) -> f64 {
    let day = day_of_year + (hour / 24.0).floor();
    let hour = hour.rem_euclid(24.0);
    let (declination, time_correction) = solar_position(day, hour);

    let hour_angle = ((hour - 12.0) * 15.0 + lon + time_correction).to_radians();
    let lat = lat.to_radians();
    let dec = declination.to_radians();

    let cos_sza = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    cos_sza.clamp(0.0, 1.0)
}

/// Integral of the cosine of the solar zenith angle over `[begin, end]`
/// hours after `base`, in seconds.
pub fn cos_solar_zenith_angle_integrated(
    lats: &[f64],
    lons: &[f64],
    base: NaiveDateTime,
    begin: f64,
    end: f64,
) -> Result<Vec<f64>> {
    check_lengths(&[("lats", lats), ("lons", lons)])?;
    if !(begin.is_finite() && end.is_finite()) || end < begin {
        return Err(FormulaError::InvalidInterval { begin, end });
    }
    if let Some(lat) = lats.iter().find(|lat| !(-90.0..=90.0).contains(*lat)) {
        return Err(FormulaError::InvalidInput {
            name: "lats",
            reason: format!("latitude {} outside [-90, 90]", lat),
        });
    }

    let day_of_year = base.ordinal() as f64;
    let base_hour = base.hour() as f64 + base.minute() as f64 / 60.0;

    // Sample times shared by all grid points
    let mut samples = Vec::new();
    let mut t0 = begin;
    while t0 < end {
        let t1 = (t0 + 1.0).min(end);
        let half = (t1 - t0) / 2.0;
        let mid = (t0 + t1) / 2.0;
        for (node, weight) in GAUSS_NODES.iter().zip(GAUSS_WEIGHTS.iter()) {
            samples.push((base_hour + mid + node * half, weight * half));
        }
        t0 = t1;
    }
    trace!(
        begin = begin,
        end = end,
        samples = samples.len(),
        "Integrating cos solar zenith angle"
    );

    let integral = lats
        .iter()
        .zip(lons)
        .map(|(&lat, &lon)| {
            let hours: f64 = samples
                .iter()
                .map(|&(hour, weight)| weight * cos_solar_zenith_angle(day_of_year, hour, lat, lon))
                .sum();
            hours * SECONDS_PER_HOUR
        })
        .collect();

    Ok(integral)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_utils::assert_approx_eq;

    fn base(month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_equator_noon_near_overhead() {
        // Around the March equinox the sun is nearly overhead at noon
        assert_approx_eq!(cos_solar_zenith_angle(80.0, 12.0, 0.0, 0.0), 1.0, 0.01);
    }

    #[test]
    fn test_night_is_zero() {
        assert_eq!(cos_solar_zenith_angle(80.0, 0.0, 0.0, 0.0), 0.0);
        // Polar night
        assert_eq!(cos_solar_zenith_angle(355.0, 12.0, 85.0, 0.0), 0.0);
    }

    #[test]
    fn test_hour_folds_into_next_day() {
        let direct = cos_solar_zenith_angle(81.0, 10.0, 45.0, 7.0);
        let folded = cos_solar_zenith_angle(80.0, 34.0, 45.0, 7.0);
        assert_approx_eq!(direct, folded, 1e-12);
    }

    #[test]
    fn test_integral_bounds() {
        let result =
            cos_solar_zenith_angle_integrated(&[50.0, 0.0], &[10.0, 0.0], base(7, 1), 0.0, 24.0)
                .unwrap();
        for value in result {
            assert!(value > 0.0);
            assert!(value < 24.0 * 3600.0);
        }
    }

    #[test]
    fn test_integral_at_night_is_zero() {
        let result =
            cos_solar_zenith_angle_integrated(&[0.0], &[0.0], base(3, 20), 0.0, 3.0).unwrap();
        assert_eq!(result, vec![0.0]);
    }

    #[test]
    fn test_integral_is_additive() {
        let lats = [48.0];
        let lons = [2.0];
        let whole = cos_solar_zenith_angle_integrated(&lats, &lons, base(6, 1), 0.0, 12.0).unwrap();
        let first = cos_solar_zenith_angle_integrated(&lats, &lons, base(6, 1), 0.0, 6.0).unwrap();
        let second = cos_solar_zenith_angle_integrated(&lats, &lons, base(6, 1), 6.0, 12.0).unwrap();
        assert_approx_eq!(whole[0], first[0] + second[0], 1e-6);
    }

    #[test]
    fn test_empty_interval() {
        let result =
            cos_solar_zenith_angle_integrated(&[10.0], &[10.0], base(6, 1), 12.0, 12.0).unwrap();
        assert_eq!(result, vec![0.0]);
    }

    #[test]
    fn test_reversed_interval_rejected() {
        let err = cos_solar_zenith_angle_integrated(&[10.0], &[10.0], base(6, 1), 6.0, 0.0)
            .unwrap_err();
        assert_eq!(err, FormulaError::InvalidInterval { begin: 6.0, end: 0.0 });
    }

    #[test]
    fn test_latitude_out_of_range() {
        let err = cos_solar_zenith_angle_integrated(&[91.0], &[0.0], base(6, 1), 0.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, FormulaError::InvalidInput { name: "lats", .. }));
    }

    #[test]
    fn test_coordinate_length_mismatch() {
        let err = cos_solar_zenith_angle_integrated(&[0.0, 1.0], &[0.0], base(6, 1), 0.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, FormulaError::LengthMismatch { name: "lons", .. }));
    }
}

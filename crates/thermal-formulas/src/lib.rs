//! Thermal comfort formulas.
//!
//! The [`ThermalFormulas`] trait is the narrow interface the index pipeline
//! calls into: plain `f64` grids in, plain grids out, every input the same
//! length. [`ReferenceFormulas`] is the bundled closed-form implementation.
//!
//! Units: temperatures in Kelvin, wind in m/s, radiative fluxes as mean
//! rates in W m-2, vapour pressure in hPa.

pub mod error;
pub mod humidity;
pub mod radiation;
pub mod solar;

use chrono::NaiveDateTime;

pub use error::{FormulaError, Result};

/// Radiation inputs to the mean radiant temperature, as mean rates.
#[derive(Debug, Clone, Copy)]
pub struct RadiationInputs<'a> {
    /// Surface solar radiation downwards
    pub ssrd: &'a [f64],
    /// Surface net solar radiation
    pub ssr: &'a [f64],
    /// Direct solar radiation at the surface
    pub fdir: &'a [f64],
    /// Surface thermal radiation downwards
    pub strd: &'a [f64],
    /// Surface net thermal radiation
    pub strr: &'a [f64],
    /// Cosine of the solar zenith angle
    pub cossza: &'a [f64],
}

/// Formula library used by the index pipeline.
///
/// Implementations must be pure: the same inputs always give the same
/// output, and the output has one value per input grid point.
pub trait ThermalFormulas {
    /// Cosine of the solar zenith angle integrated over a time interval.
    ///
    /// # Arguments
    /// * `lats`, `lons` - Grid point coordinates in degrees
    /// * `base` - Base date and time the interval is relative to (UTC)
    /// * `begin`, `end` - Interval bounds in hours after `base`
    ///
    /// # Returns
    /// * The integral in seconds; night-time contributes zero
    fn cos_solar_zenith_angle_integrated(
        &self,
        lats: &[f64],
        lons: &[f64],
        base: NaiveDateTime,
        begin: f64,
        end: f64,
    ) -> Result<Vec<f64>>;

    /// Mean radiant temperature in Kelvin.
    fn mean_radiant_temperature(&self, inputs: &RadiationInputs<'_>) -> Result<Vec<f64>>;

    /// Apparent temperature in Kelvin from 2m temperature and wind speed.
    fn apparent_temperature(&self, t2m: &[f64], va: &[f64]) -> Result<Vec<f64>>;

    /// Relative humidity in percent from 2m temperature and dewpoint.
    fn relative_humidity_percent(&self, t2m: &[f64], td: &[f64]) -> Result<Vec<f64>>;

    /// Saturation vapour pressure over water in hPa.
    fn saturation_vapour_pressure(&self, t2m: &[f64]) -> Result<Vec<f64>>;

    /// Universal Thermal Climate Index in Kelvin.
    ///
    /// # Arguments
    /// * `t2m` - 2m temperature (K)
    /// * `va` - 10m wind speed (m/s)
    /// * `mrt` - Mean radiant temperature (K)
    /// * `e_hpa` - Water vapour pressure (hPa)
    fn utci(&self, t2m: &[f64], va: &[f64], mrt: &[f64], e_hpa: &[f64]) -> Result<Vec<f64>>;
}

/// Closed-form implementation of [`ThermalFormulas`].
///
/// UTCI needs the operational polynomial regression, which is not part of
/// this crate; [`ThermalFormulas::utci`] returns [`FormulaError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceFormulas;

impl ThermalFormulas for ReferenceFormulas {
    fn cos_solar_zenith_angle_integrated(
        &self,
        lats: &[f64],
        lons: &[f64],
        base: NaiveDateTime,
        begin: f64,
        end: f64,
    ) -> Result<Vec<f64>> {
        solar::cos_solar_zenith_angle_integrated(lats, lons, base, begin, end)
    }

    fn mean_radiant_temperature(&self, inputs: &RadiationInputs<'_>) -> Result<Vec<f64>> {
        radiation::mean_radiant_temperature(inputs)
    }

    fn apparent_temperature(&self, t2m: &[f64], va: &[f64]) -> Result<Vec<f64>> {
        humidity::apparent_temperature(t2m, va)
    }

    fn relative_humidity_percent(&self, t2m: &[f64], td: &[f64]) -> Result<Vec<f64>> {
        humidity::relative_humidity_percent(t2m, td)
    }

    fn saturation_vapour_pressure(&self, t2m: &[f64]) -> Result<Vec<f64>> {
        Ok(t2m.iter().map(|&t| humidity::saturation_vapour_pressure(t)).collect())
    }

    fn utci(&self, t2m: &[f64], va: &[f64], mrt: &[f64], e_hpa: &[f64]) -> Result<Vec<f64>> {
        error::check_lengths(&[("t2m", t2m), ("va", va), ("mrt", mrt), ("e_hpa", e_hpa)])?;
        Err(FormulaError::Unavailable("utci"))
    }
}

/// Convert Kelvin to degrees Celsius.
pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

/// Convert degrees Celsius to Kelvin.
pub fn celsius_to_kelvin(c: f64) -> f64 {
    c + 273.15
}

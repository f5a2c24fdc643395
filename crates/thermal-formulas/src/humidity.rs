//! Humidity and apparent temperature.

use crate::error::{check_lengths, Result};
use crate::{celsius_to_kelvin, kelvin_to_celsius};

/// ITS-90 coefficients for saturation vapour pressure over water (Hardy, 1998).
const SVP_COEFFICIENTS: [f64; 8] = [
    -2.8365744e3,
    -6.028076559e3,
    1.954263612e1,
    -2.737830188e-2,
    1.6261698e-5,
    7.0229056e-10,
    -1.8680009e-13,
    2.7150305,
];

/// Saturation vapour pressure over water in hPa at temperature `tk` (Kelvin).
pub fn saturation_vapour_pressure(tk: f64) -> f64 {
    let g = &SVP_COEFFICIENTS;
    let mut ln_es = g[7] * tk.ln();
    for (i, coefficient) in g.iter().take(7).enumerate() {
        ln_es += coefficient * tk.powi(i as i32 - 2);
    }
    ln_es.exp() * 0.01
}

/// Vapour pressure in hPa from the Magnus form, temperature in Celsius.
fn magnus(tc: f64) -> f64 {
    6.11 * 10f64.powf(7.5 * tc / (237.7 + tc))
}

/// Relative humidity in percent from temperature and dewpoint (Kelvin).
pub fn relative_humidity_percent(t2m: &[f64], td: &[f64]) -> Result<Vec<f64>> {
    check_lengths(&[("t2m", t2m), ("td", td)])?;
    Ok(t2m
        .iter()
        .zip(td)
        .map(|(&t, &d)| magnus(kelvin_to_celsius(d)) / magnus(kelvin_to_celsius(t)) * 100.0)
        .collect())
}

/// Apparent temperature (Steadman) in Kelvin.
///
/// Vapour pressure is taken at saturation for the air temperature.
pub fn apparent_temperature(t2m: &[f64], va: &[f64]) -> Result<Vec<f64>> {
    check_lengths(&[("t2m", t2m), ("va", va)])?;
    Ok(t2m
        .iter()
        .zip(va)
        .map(|(&t, &v)| {
            let e = saturation_vapour_pressure(t);
            celsius_to_kelvin(kelvin_to_celsius(t) + 0.33 * e - 0.7 * v - 4.0)
        })
        .collect())
}

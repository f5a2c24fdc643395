//! Mean radiant temperature from surface radiation fluxes.

use tracing::trace;

use crate::error::{check_lengths, Result};
use crate::RadiationInputs;

/// Stefan-Boltzmann constant (W m-2 K-4).
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Absorption coefficient for shortwave radiation.
const SHORTWAVE_ABSORPTION: f64 = 0.7;
/// Emissivity of the clothed human body.
const BODY_EMISSIVITY: f64 = 0.97;
/// Below this cosine the direct beam is not normalised.
const MIN_COS_SZA: f64 = 0.01;

/// Projected area factor for a standing person at solar elevation `gamma` (degrees).
fn projected_area_factor(gamma: f64) -> f64 {
    0.308 * (gamma * (0.998 - gamma * gamma / 50000.0)).to_radians().cos()
}

/// Mean radiant temperature in Kelvin.
///
/// Fluxes are mean rates in W m-2. `cossza` is the mean cosine of the
/// solar zenith angle over the same period.
pub fn mean_radiant_temperature(inputs: &RadiationInputs<'_>) -> Result<Vec<f64>> {
    let n = check_lengths(&[
        ("ssrd", inputs.ssrd),
        ("ssr", inputs.ssr),
        ("fdir", inputs.fdir),
        ("strd", inputs.strd),
        ("strr", inputs.strr),
        ("cossza", inputs.cossza),
    ])?;
    trace!(points = n, "Computing mean radiant temperature");

    let mut mrt = Vec::with_capacity(n);
    for i in 0..n {
        let ssrd = inputs.ssrd[i];
        let fdir = inputs.fdir[i];
        let strd = inputs.strd[i];
        let cossza = inputs.cossza[i];

        let diffuse = ssrd - fdir;
        let reflected = ssrd - inputs.ssr[i];
        let longwave_up = strd - inputs.strr[i];

        let gamma = cossza.clamp(-1.0, 1.0).asin().to_degrees();
        let fp = projected_area_factor(gamma);
        let direct = if cossza > MIN_COS_SZA { fdir / cossza } else { fdir };

        let absorbed = 0.5 * strd
            + 0.5 * longwave_up
            + SHORTWAVE_ABSORPTION / BODY_EMISSIVITY * (0.5 * diffuse + 0.5 * reflected + fp * direct);
        mrt.push((absorbed / STEFAN_BOLTZMANN).powf(0.25));
    }
    Ok(mrt)
}

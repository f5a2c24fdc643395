//! Thermal index derivation for validated batches.
//!
//! The pipeline picks fields out of a batch by role, converts accumulated
//! fluxes to mean rates, and threads intermediate results between formula
//! calls. Only the configured outputs and what they depend on are computed,
//! always in the order of [`IndexKind::ALL`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thermal_formulas::{FormulaError, RadiationInputs, ThermalFormulas};
use tracing::{debug, info};

use crate::config::FieldRoles;
use crate::error::{PipelineError, Result};
use crate::record::{Batch, GridShape, ParameterId, Record};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// A derivable index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Cosine of the solar zenith angle, integrated over the step
    Cossza,
    /// 10m wind speed
    WindSpeed,
    /// Mean radiant temperature
    Mrt,
    ApparentTemperature,
    /// Universal Thermal Climate Index
    Utci,
}

impl IndexKind {
    /// Every index in evaluation order.
    pub const ALL: [IndexKind; 5] = [
        IndexKind::Cossza,
        IndexKind::WindSpeed,
        IndexKind::Mrt,
        IndexKind::ApparentTemperature,
        IndexKind::Utci,
    ];

    /// Short name of the output parameter.
    pub fn short_name(&self) -> &'static str {
        match self {
            IndexKind::Cossza => "cossza",
            IndexKind::WindSpeed => "ws",
            IndexKind::Mrt => "mrt",
            IndexKind::ApparentTemperature => "aptmp",
            IndexKind::Utci => "utci",
        }
    }

    /// Parameter identifier of the output field.
    pub fn param_id(&self) -> u32 {
        match self {
            IndexKind::Cossza => 214001,
            IndexKind::WindSpeed => 10,
            IndexKind::Mrt => 261002,
            IndexKind::ApparentTemperature => 260255,
            IndexKind::Utci => 261001,
        }
    }

    pub fn parameter(&self) -> ParameterId {
        ParameterId::new(self.param_id(), self.short_name())
    }

    /// Indices that must be computed first.
    pub fn prerequisites(&self) -> &'static [IndexKind] {
        match self {
            IndexKind::Cossza | IndexKind::WindSpeed => &[],
            IndexKind::Mrt => &[IndexKind::Cossza],
            IndexKind::ApparentTemperature => &[IndexKind::WindSpeed],
            IndexKind::Utci => &[IndexKind::WindSpeed, IndexKind::Mrt],
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A derived grid, shaped like the batch it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedIndex {
    pub kind: IndexKind,
    pub shape: GridShape,
    pub values: Vec<f64>,
}

/// Factor converting a flux accumulated over `step` hours to a mean rate.
pub fn flux_scaling_factor(step: u32) -> Result<f64> {
    if step == 0 {
        return Err(PipelineError::Derivation {
            index: IndexKind::Mrt.to_string(),
            reason: "accumulated fluxes need a step greater than zero".to_string(),
        });
    }
    Ok(1.0 / (step as f64 * SECONDS_PER_HOUR))
}

/// Integration interval in hours after the base date: from the base time
/// of day to the end of the step.
pub fn forecast_interval(time: u32, step: u32) -> Result<(u32, u32)> {
    let begin = time / 100;
    let end = begin
        .checked_add(step)
        .ok_or_else(|| PipelineError::Derivation {
            index: IndexKind::Cossza.to_string(),
            reason: format!("interval end {}h + {}h overflows", begin, step),
        })?;
    Ok((begin, end))
}

/// Euclidean norm of the wind components at every grid point.
pub fn wind_speed(u: &[f64], v: &[f64]) -> Result<Vec<f64>> {
    if u.len() != v.len() {
        return Err(derivation_error(
            IndexKind::WindSpeed,
            FormulaError::LengthMismatch {
                name: "wind_v",
                expected: u.len(),
                found: v.len(),
            },
        ));
    }
    Ok(u.iter().zip(v).map(|(u, v)| (u * u + v * v).sqrt()).collect())
}

fn derivation_error(kind: IndexKind, err: FormulaError) -> PipelineError {
    PipelineError::Derivation {
        index: kind.to_string(),
        reason: err.to_string(),
    }
}

fn scaled(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}

/// Derives the configured indices from validated batches.
pub struct IndexPipeline<F> {
    formulas: F,
    roles: FieldRoles,
    outputs: Vec<IndexKind>,
    plan: Vec<IndexKind>,
}

impl<F: ThermalFormulas> IndexPipeline<F> {
    pub fn new(formulas: F, roles: FieldRoles, outputs: &[IndexKind]) -> Self {
        let mut needed: Vec<IndexKind> = Vec::new();
        let mut stack: Vec<IndexKind> = outputs.to_vec();
        while let Some(kind) = stack.pop() {
            if !needed.contains(&kind) {
                needed.push(kind);
                stack.extend_from_slice(kind.prerequisites());
            }
        }
        let plan = IndexKind::ALL
            .into_iter()
            .filter(|kind| needed.contains(kind))
            .collect();
        let mut outputs = outputs.to_vec();
        outputs.sort();
        outputs.dedup();

        Self {
            formulas,
            roles,
            outputs,
            plan,
        }
    }

    /// Every index computed per batch, in evaluation order.
    pub fn plan(&self) -> &[IndexKind] {
        &self.plan
    }

    /// Indices returned per batch, in evaluation order.
    pub fn outputs(&self) -> &[IndexKind] {
        &self.outputs
    }

    pub fn formulas(&self) -> &F {
        &self.formulas
    }

    /// Run the plan on one batch and return the configured outputs.
    pub fn run<H>(&self, batch: &Batch<H>) -> Result<Vec<DerivedIndex>> {
        let temperature = self.field(batch, &self.roles.temperature)?;
        let shape = temperature.shape;
        let (begin, end) = forecast_interval(temperature.time, temperature.step)?;
        info!(
            date = %temperature.date,
            time = temperature.base_hour(),
            interval = %format!("[{},{}]", begin, end),
            key = %batch.key(),
            "Deriving thermal indices"
        );

        let mut derived: BTreeMap<IndexKind, Vec<f64>> = BTreeMap::new();
        for &kind in &self.plan {
            let values = match kind {
                IndexKind::Cossza => self.cossza(temperature, begin, end)?,
                IndexKind::WindSpeed => {
                    let u = self.field(batch, &self.roles.wind_u)?;
                    let v = self.field(batch, &self.roles.wind_v)?;
                    wind_speed(&u.values, &v.values)?
                }
                IndexKind::Mrt => {
                    let cossza = computed(&derived, IndexKind::Cossza)?;
                    self.mrt(batch, batch.key().step, cossza)?
                }
                IndexKind::ApparentTemperature => {
                    let va = computed(&derived, IndexKind::WindSpeed)?;
                    self.formulas
                        .apparent_temperature(&temperature.values, va)
                        .map_err(|e| derivation_error(kind, e))?
                }
                IndexKind::Utci => {
                    let va = computed(&derived, IndexKind::WindSpeed)?;
                    let mrt = computed(&derived, IndexKind::Mrt)?;
                    self.utci(batch, temperature, va, mrt)?
                }
            };
            debug!(index = %kind, points = values.len(), "Derived index");
            derived.insert(kind, values);
        }

        Ok(self
            .outputs
            .iter()
            .filter_map(|kind| {
                derived.remove(kind).map(|values| DerivedIndex {
                    kind: *kind,
                    shape,
                    values,
                })
            })
            .collect())
    }

    fn field<'b, H>(&self, batch: &'b Batch<H>, short_name: &str) -> Result<&'b Record<H>> {
        batch.get(short_name).ok_or_else(|| PipelineError::Derivation {
            index: "batch".to_string(),
            reason: format!("field '{}' not in batch {}", short_name, batch.key()),
        })
    }

    fn cossza<H>(&self, template: &Record<H>, begin: u32, end: u32) -> Result<Vec<f64>> {
        self.formulas
            .cos_solar_zenith_angle_integrated(
                &template.latitudes,
                &template.longitudes,
                template.base_datetime(),
                begin as f64,
                end as f64,
            )
            .map_err(|e| derivation_error(IndexKind::Cossza, e))
    }

    fn mrt<H>(&self, batch: &Batch<H>, step: u32, cossza: &[f64]) -> Result<Vec<f64>> {
        let factor = flux_scaling_factor(step)?;
        let flux = |name: &str| -> Result<Vec<f64>> {
            Ok(scaled(&self.field(batch, name)?.values, factor))
        };

        let ssrd = flux(&self.roles.ssrd)?;
        let ssr = flux(&self.roles.ssr)?;
        let fdir = flux(&self.roles.fdir)?;
        let strd = flux(&self.roles.strd)?;
        let strr = flux(&self.roles.strr)?;
        let cossza = scaled(cossza, factor);

        self.formulas
            .mean_radiant_temperature(&RadiationInputs {
                ssrd: &ssrd,
                ssr: &ssr,
                fdir: &fdir,
                strd: &strd,
                strr: &strr,
                cossza: &cossza,
            })
            .map_err(|e| derivation_error(IndexKind::Mrt, e))
    }

    fn utci<H>(
        &self,
        batch: &Batch<H>,
        temperature: &Record<H>,
        va: &[f64],
        mrt: &[f64],
    ) -> Result<Vec<f64>> {
        let to_err = |e| derivation_error(IndexKind::Utci, e);
        let t2m = &temperature.values;
        let dewpoint = self.field(batch, &self.roles.dewpoint)?;

        let rh = self
            .formulas
            .relative_humidity_percent(t2m, &dewpoint.values)
            .map_err(to_err)?;
        let svp = self.formulas.saturation_vapour_pressure(t2m).map_err(to_err)?;
        let e_hpa: Vec<f64> = svp.iter().zip(&rh).map(|(es, rh)| es * rh / 100.0).collect();

        self.formulas.utci(t2m, va, mrt, &e_hpa).map_err(to_err)
    }
}

fn computed(derived: &BTreeMap<IndexKind, Vec<f64>>, kind: IndexKind) -> Result<&[f64]> {
    derived
        .get(&kind)
        .map(Vec::as_slice)
        .ok_or_else(|| PipelineError::Derivation {
            index: kind.to_string(),
            reason: "prerequisite was not computed".to_string(),
        })
}

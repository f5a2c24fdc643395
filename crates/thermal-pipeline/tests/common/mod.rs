//! Common test utilities for thermal-pipeline tests
//!
//! Provides:
//! - Fake records whose handles log their release
//! - A recording encoder
//! - Deterministic fake formulas that log their inputs

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use test_utils::{lat_lon_grid, typical_value, FLUX_FIELDS, SURFACE_FIELDS};
use thermal_formulas::{FormulaError, RadiationInputs, ThermalFormulas};
use thermal_pipeline::{
    GridShape, GroupKey, IterDecoder, ParameterId, PipelineError, Record, RecordEncoder,
};

// ============================================================================
// Handles
// ============================================================================

/// Shared log of acquired and released handle ids.
#[derive(Clone, Default)]
pub struct ReleaseLog {
    acquired: Rc<RefCell<usize>>,
    released: Rc<RefCell<Vec<usize>>>,
}

impl ReleaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> FakeHandle {
        let mut acquired = self.acquired.borrow_mut();
        let id = *acquired;
        *acquired += 1;
        FakeHandle {
            id,
            released: Rc::clone(&self.released),
        }
    }

    pub fn acquired(&self) -> usize {
        *self.acquired.borrow()
    }

    /// Released ids in release order.
    pub fn released(&self) -> Vec<usize> {
        self.released.borrow().clone()
    }

    /// Every acquired handle was released exactly once.
    pub fn assert_all_released_once(&self) {
        let mut released = self.released();
        released.sort_unstable();
        let expected: Vec<usize> = (0..self.acquired()).collect();
        assert_eq!(released, expected, "handles leaked or released twice");
    }
}

/// Handle that records its id in the shared log when dropped.
#[derive(Debug)]
pub struct FakeHandle {
    pub id: usize,
    released: Rc<RefCell<Vec<usize>>>,
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.released.borrow_mut().push(self.id);
    }
}

// ============================================================================
// Records
// ============================================================================

pub const NI: u32 = 2;
pub const NJ: u32 = 2;

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

/// A 2x2 record filled with `values`.
pub fn record(
    log: &ReleaseLog,
    name: &str,
    step: u32,
    member: u32,
    values: Vec<f64>,
) -> Record<FakeHandle> {
    let (latitudes, longitudes) = lat_lon_grid(NI as usize, NJ as usize, 50.0, 10.0, 0.25);
    Record {
        short_name: name.to_string(),
        param_id: None,
        shape: GridShape::new(NI, NJ),
        date: base_date(),
        time: 0,
        step,
        member,
        latitudes,
        longitudes,
        values,
        handle: log.acquire(),
    }
}

/// Values used for `name` in a surface batch: the typical value offset by
/// the point index, with fluxes accumulated over `step` hours.
pub fn surface_values(name: &str, step: u32) -> Vec<f64> {
    let n = (NI * NJ) as usize;
    (0..n)
        .map(|i| {
            let value = typical_value(name) + i as f64;
            if FLUX_FIELDS.contains(&name) {
                value * step as f64 * 3600.0
            } else {
                value
            }
        })
        .collect()
}

/// The nine surface records of one (step, member) group, skipping `omit`.
pub fn surface_batch(
    log: &ReleaseLog,
    step: u32,
    member: u32,
    omit: &[&str],
) -> Vec<Record<FakeHandle>> {
    SURFACE_FIELDS
        .iter()
        .filter(|name| !omit.contains(*name))
        .map(|name| record(log, name, step, member, surface_values(name, step)))
        .collect()
}

pub fn decoder(
    records: Vec<Record<FakeHandle>>,
) -> IterDecoder<std::vec::IntoIter<Result<Record<FakeHandle>, PipelineError>>> {
    IterDecoder::new(records.into_iter().map(Ok).collect::<Vec<_>>())
}

// ============================================================================
// Encoder
// ============================================================================

/// One call to [`RecordingEncoder::encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub template: String,
    pub key: GroupKey,
    pub target: ParameterId,
    pub values: Vec<f64>,
}

/// Encoder keeping every write in memory.
#[derive(Default)]
pub struct RecordingEncoder {
    pub written: Vec<Written>,
    pub finished: bool,
    /// Fail the write with this index (0-based)
    pub fail_at: Option<usize>,
}

impl<H> RecordEncoder<H> for RecordingEncoder {
    fn encode(&mut self, template: &Record<H>, target: &ParameterId, values: &[f64]) -> Result<usize, PipelineError> {
        if self.fail_at == Some(self.written.len()) {
            return Err(PipelineError::Encode {
                index: target.to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.written.push(Written {
            template: template.short_name.clone(),
            key: template.key(),
            target: target.clone(),
            values: values.to_vec(),
        });
        Ok(values.len() * 8)
    }

    fn finish(&mut self) -> Result<(), PipelineError> {
        self.finished = true;
        Ok(())
    }
}

// ============================================================================
// Formulas
// ============================================================================

/// Inputs seen by [`FakeFormulas`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Cossza {
        base: NaiveDateTime,
        begin: f64,
        end: f64,
        points: usize,
    },
    Mrt {
        ssrd: Vec<f64>,
        ssr: Vec<f64>,
        fdir: Vec<f64>,
        strd: Vec<f64>,
        strr: Vec<f64>,
        cossza: Vec<f64>,
    },
    ApparentTemperature {
        t2m: Vec<f64>,
        va: Vec<f64>,
    },
    Utci {
        va: Vec<f64>,
        mrt: Vec<f64>,
        e_hpa: Vec<f64>,
    },
}

/// Deterministic formulas with simple closed forms:
/// - cossza: `(end - begin) * 1800` at every point
/// - mrt: `ssrd + strd + cossza`
/// - apparent temperature: `t2m - va`
/// - relative humidity: 50%, saturation vapour pressure: 20 hPa
/// - utci: `t2m + va + mrt + e`
#[derive(Clone, Default)]
pub struct FakeFormulas {
    pub calls: Rc<RefCell<Vec<Call>>>,
}

impl FakeFormulas {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl ThermalFormulas for FakeFormulas {
    fn cos_solar_zenith_angle_integrated(
        &self,
        lats: &[f64],
        _lons: &[f64],
        base: NaiveDateTime,
        begin: f64,
        end: f64,
    ) -> thermal_formulas::Result<Vec<f64>> {
        self.calls.borrow_mut().push(Call::Cossza {
            base,
            begin,
            end,
            points: lats.len(),
        });
        Ok(vec![(end - begin) * 1800.0; lats.len()])
    }

    fn mean_radiant_temperature(&self, inputs: &RadiationInputs<'_>) -> thermal_formulas::Result<Vec<f64>> {
        self.calls.borrow_mut().push(Call::Mrt {
            ssrd: inputs.ssrd.to_vec(),
            ssr: inputs.ssr.to_vec(),
            fdir: inputs.fdir.to_vec(),
            strd: inputs.strd.to_vec(),
            strr: inputs.strr.to_vec(),
            cossza: inputs.cossza.to_vec(),
        });
        Ok(inputs
            .ssrd
            .iter()
            .zip(inputs.strd)
            .zip(inputs.cossza)
            .map(|((s, l), c)| s + l + c)
            .collect())
    }

    fn apparent_temperature(&self, t2m: &[f64], va: &[f64]) -> thermal_formulas::Result<Vec<f64>> {
        self.calls.borrow_mut().push(Call::ApparentTemperature {
            t2m: t2m.to_vec(),
            va: va.to_vec(),
        });
        Ok(t2m.iter().zip(va).map(|(t, v)| t - v).collect())
    }

    fn relative_humidity_percent(&self, t2m: &[f64], _td: &[f64]) -> thermal_formulas::Result<Vec<f64>> {
        Ok(vec![50.0; t2m.len()])
    }

    fn saturation_vapour_pressure(&self, t2m: &[f64]) -> thermal_formulas::Result<Vec<f64>> {
        Ok(vec![20.0; t2m.len()])
    }

    fn utci(&self, t2m: &[f64], va: &[f64], mrt: &[f64], e_hpa: &[f64]) -> thermal_formulas::Result<Vec<f64>> {
        if t2m.iter().any(|t| t.is_nan()) {
            return Err(FormulaError::InvalidInput {
                name: "t2m",
                reason: "NaN".to_string(),
            });
        }
        self.calls.borrow_mut().push(Call::Utci {
            va: va.to_vec(),
            mrt: mrt.to_vec(),
            e_hpa: e_hpa.to_vec(),
        });
        Ok((0..t2m.len())
            .map(|i| t2m[i] + va[i] + mrt[i] + e_hpa[i])
            .collect())
    }
}

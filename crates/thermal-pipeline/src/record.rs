//! Decoded records and the batches they are grouped into.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Partition key of the record stream: forecast step and ensemble member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    /// Forecast step in hours
    pub step: u32,
    /// Ensemble member number (0 for deterministic forecasts)
    pub member: u32,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step={} member={}", self.step, self.member)
    }
}

/// Grid dimensions: points along a parallel (Ni) and a meridian (Nj).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridShape {
    pub ni: u32,
    pub nj: u32,
}

impl GridShape {
    pub fn new(ni: u32, nj: u32) -> Self {
        Self { ni, nj }
    }

    pub fn num_points(&self) -> usize {
        self.ni as usize * self.nj as usize
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.ni, self.nj)
    }
}

/// Numeric parameter identifier with its short name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParameterId {
    pub id: u32,
    pub short_name: String,
}

impl ParameterId {
    pub fn new(id: u32, short_name: impl Into<String>) -> Self {
        Self {
            id,
            short_name: short_name.into(),
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short_name, self.id)
    }
}

/// One decoded message.
///
/// `handle` is the decoder's native resource for the message. It is
/// released when the record is dropped.
#[derive(Debug)]
pub struct Record<H> {
    pub short_name: String,
    pub param_id: Option<u32>,
    pub shape: GridShape,
    /// Forecast base date
    pub date: NaiveDate,
    /// Base time of day as `hhmm`
    pub time: u32,
    /// Forecast step in hours
    pub step: u32,
    pub member: u32,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub values: Vec<f64>,
    pub handle: H,
}

impl<H> Record<H> {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            step: self.step,
            member: self.member,
        }
    }

    /// Midnight of the forecast base date.
    pub fn base_datetime(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    /// Whole hours of the base time of day.
    pub fn base_hour(&self) -> u32 {
        self.time / 100
    }

    /// Valid time: base date + time of day + step.
    pub fn forecast_datetime(&self) -> Result<NaiveDateTime> {
        let minutes = (self.time / 100) as i64 * 60 + (self.time % 100) as i64;
        self.base_datetime()
            .checked_add_signed(Duration::minutes(minutes))
            .and_then(|t| t.checked_add_signed(Duration::hours(self.step as i64)))
            .ok_or_else(|| {
                PipelineError::Decode(format!(
                    "Field '{}': valid time of {} {:04} + {}h is out of range",
                    self.short_name, self.date, self.time, self.step
                ))
            })
    }

    /// Check that coordinates and values cover the grid exactly once.
    pub fn check_lengths(&self) -> Result<()> {
        let expected = self.shape.num_points();
        for (name, len) in [
            ("latitudes", self.latitudes.len()),
            ("longitudes", self.longitudes.len()),
            ("values", self.values.len()),
        ] {
            if len != expected {
                return Err(PipelineError::Decode(format!(
                    "Record '{}' has {} {} for a {} grid",
                    self.short_name, len, name, self.shape
                )));
            }
        }
        Ok(())
    }
}

/// Records sharing one [`GroupKey`], keyed by field short name.
#[derive(Debug)]
pub struct Batch<H> {
    key: GroupKey,
    records: BTreeMap<String, Record<H>>,
}

impl<H> Batch<H> {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            records: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Add a record; a short name already present is a grouping violation.
    pub fn insert(&mut self, record: Record<H>) -> Result<()> {
        if self.records.contains_key(&record.short_name) {
            return Err(PipelineError::DuplicateField {
                field: record.short_name,
                key: self.key,
            });
        }
        self.records.insert(record.short_name.clone(), record);
        Ok(())
    }

    pub fn get(&self, short_name: &str) -> Option<&Record<H>> {
        self.records.get(short_name)
    }

    pub fn contains(&self, short_name: &str) -> bool {
        self.records.contains_key(short_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Field short names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record<H>> {
        self.records.values()
    }

    /// Drop every record, releasing their handles. Returns how many were held.
    pub fn clear(&mut self) -> usize {
        let released = self.records.len();
        self.records.clear();
        released
    }
}

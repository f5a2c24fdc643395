//! Completeness and consistency checks for aggregated batches.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::{Batch, Record};

/// Verifies that a batch holds exactly the required fields and that all of
/// them describe the same grid and valid time.
///
/// Validation has no side effects: the same batch always gets the same
/// verdict.
#[derive(Debug, Clone)]
pub struct BatchValidator {
    required: BTreeSet<String>,
}

impl BatchValidator {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of fields a complete batch holds.
    pub fn required_count(&self) -> usize {
        self.required.len()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    /// Check, in order, field membership, grid shape and valid time.
    pub fn validate<H>(&self, batch: &Batch<H>) -> Result<()> {
        self.check_membership(batch)?;

        let mut records = batch.records();
        let Some(reference) = records.next() else {
            return Ok(());
        };
        for record in records {
            check_shape(batch, reference, record)?;
        }
        let valid_time = reference.forecast_datetime()?;
        for record in batch.records() {
            let found = record.forecast_datetime()?;
            if found != valid_time {
                return Err(PipelineError::BatchInconsistent {
                    key: batch.key(),
                    field: record.short_name.clone(),
                    property: "forecast time",
                    expected: valid_time.to_string(),
                    found: found.to_string(),
                });
            }
        }

        debug!(
            key = %batch.key(),
            fields = batch.len(),
            valid_time = %valid_time,
            "Batch validated"
        );
        Ok(())
    }

    fn check_membership<H>(&self, batch: &Batch<H>) -> Result<()> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !batch.contains(name))
            .cloned()
            .collect();
        let unexpected: Vec<String> = batch
            .field_names()
            .filter(|name| !self.required.contains(*name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() && unexpected.is_empty() && batch.len() == self.required_count() {
            return Ok(());
        }
        Err(PipelineError::BatchIncomplete {
            key: batch.key(),
            missing,
            unexpected,
        })
    }
}

fn check_shape<H>(batch: &Batch<H>, reference: &Record<H>, record: &Record<H>) -> Result<()> {
    let inconsistent = |property: &'static str, expected: String, found: String| {
        PipelineError::BatchInconsistent {
            key: batch.key(),
            field: record.short_name.clone(),
            property,
            expected,
            found,
        }
    };

    if record.shape != reference.shape {
        return Err(inconsistent(
            "grid shape",
            reference.shape.to_string(),
            record.shape.to_string(),
        ));
    }
    if record.latitudes.len() != reference.latitudes.len()
        || record.longitudes.len() != reference.longitudes.len()
    {
        return Err(inconsistent(
            "point count",
            reference.latitudes.len().to_string(),
            record.latitudes.len().to_string(),
        ));
    }
    Ok(())
}

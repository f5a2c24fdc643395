//! Run configuration.
//!
//! Loaded from YAML; every field has a default so an empty file (or no
//! file at all) gives the standard nine-field surface batch producing mean
//! radiant temperature.

use std::fs;
use std::path::{Path, PathBuf};

use grib2_parser::{Grib2Tables, ParameterEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::pipeline::IndexKind;

/// What to do with a batch that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidBatchPolicy {
    /// Stop the run with the validation error
    #[default]
    Abort,
    /// Log a warning and continue with the next batch
    Skip,
}

/// Short names of the fields each derivation reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRoles {
    pub temperature: String,
    pub dewpoint: String,
    pub wind_u: String,
    pub wind_v: String,
    pub ssrd: String,
    pub ssr: String,
    pub fdir: String,
    pub strd: String,
    pub strr: String,
}

impl Default for FieldRoles {
    fn default() -> Self {
        Self {
            temperature: "2t".to_string(),
            dewpoint: "2d".to_string(),
            wind_u: "10u".to_string(),
            wind_v: "10v".to_string(),
            ssrd: "ssrd".to_string(),
            ssr: "ssr".to_string(),
            fdir: "fdir".to_string(),
            strd: "strd".to_string(),
            strr: "str".to_string(),
        }
    }
}

impl FieldRoles {
    /// `(role, short name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("temperature", self.temperature.as_str()),
            ("dewpoint", self.dewpoint.as_str()),
            ("wind_u", self.wind_u.as_str()),
            ("wind_v", self.wind_v.as_str()),
            ("ssrd", self.ssrd.as_str()),
            ("ssr", self.ssr.as_str()),
            ("fdir", self.fdir.as_str()),
            ("strd", self.strd.as_str()),
            ("strr", self.strr.as_str()),
        ]
        .into_iter()
    }
}

/// Extra GRIB2 parameter mapping merged over the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOverride {
    pub short_name: String,
    pub param_id: u32,
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
}

/// Configuration of a thermal index run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Field short names a complete batch must hold, no more and no fewer
    pub required_fields: Vec<String>,
    pub fields: FieldRoles,
    /// Derived indices written for every batch.
    ///
    /// `utci` needs a formula set that implements it; the bundled
    /// `ReferenceFormulas` do not, so the `thermal-indexer` binary rejects it.
    pub outputs: Vec<IndexKind>,
    pub on_invalid_batch: InvalidBatchPolicy,
    /// Batch record used as template for output messages
    pub template_field: String,
    /// Where to write the JSON run manifest, if anywhere
    pub manifest_path: Option<PathBuf>,
    pub parameters: Vec<ParameterOverride>,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            required_fields: ["2t", "2d", "10u", "10v", "ssrd", "ssr", "fdir", "strd", "str"]
                .into_iter()
                .map(String::from)
                .collect(),
            fields: FieldRoles::default(),
            outputs: vec![IndexKind::Mrt],
            on_invalid_batch: InvalidBatchPolicy::Abort,
            template_field: "2t".to_string(),
            manifest_path: None,
            parameters: Vec::new(),
        }
    }
}

impl ThermalConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Cannot read {:?}: {}", path, e)))?;
        let config = Self::from_yaml_str(&contents)
            .map_err(|e| PipelineError::Config(format!("{:?}: {}", path, e)))?;
        debug!(
            path = %path.display(),
            required = config.required_fields.len(),
            outputs = ?config.outputs,
            "Loaded thermal config"
        );
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(contents)
                .map_err(|e| PipelineError::Config(format!("Invalid YAML: {}", e)))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.required_fields.is_empty() {
            return Err(PipelineError::Config(
                "required_fields must not be empty".to_string(),
            ));
        }
        for (i, name) in self.required_fields.iter().enumerate() {
            if self.required_fields[..i].contains(name) {
                return Err(PipelineError::Config(format!(
                    "required field '{}' is listed twice",
                    name
                )));
            }
        }
        for (role, name) in self.fields.iter() {
            if !self.is_required(name) {
                return Err(PipelineError::Config(format!(
                    "field '{}' for role {} is not a required field",
                    name, role
                )));
            }
        }
        if !self.is_required(&self.template_field) {
            return Err(PipelineError::Config(format!(
                "template field '{}' is not a required field",
                self.template_field
            )));
        }
        Ok(())
    }

    /// Number of fields in a complete batch.
    pub fn required_count(&self) -> usize {
        self.required_fields.len()
    }

    fn is_required(&self, name: &str) -> bool {
        self.required_fields.iter().any(|f| f == name)
    }

    /// Built-in GRIB2 tables with the configured overrides applied.
    pub fn grib_tables(&self) -> Grib2Tables {
        let mut tables = Grib2Tables::ecmwf_surface();
        for p in &self.parameters {
            tables.add_parameter(ParameterEntry::new(
                &p.short_name,
                p.param_id,
                p.discipline,
                p.category,
                p.number,
            ));
        }
        tables
    }
}

//! Run driver: aggregate, validate, derive and encode every batch of a stream.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thermal_formulas::ThermalFormulas;
use tracing::{debug, info, warn};

use crate::aggregator::BatchAggregator;
use crate::config::{InvalidBatchPolicy, ThermalConfig};
use crate::error::{PipelineError, Result};
use crate::pipeline::{IndexKind, IndexPipeline};
use crate::record::{Batch, GroupKey};
use crate::source::{RecordDecoder, RecordEncoder};
use crate::validator::BatchValidator;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub records_read: usize,
    pub batches_read: usize,
    pub batches_processed: usize,
    pub batches_skipped: usize,
    pub messages_written: usize,
    pub bytes_written: u64,
}

/// One derived message written to the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub key: GroupKey,
    pub index: IndexKind,
    pub param_id: u32,
    pub bytes: usize,
}

/// Record of what a run wrote, so partial output can be told apart from
/// complete output.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    /// Whether the whole input was processed
    pub complete: bool,
    pub error: Option<String>,
    pub summary: RunSummary,
    pub outputs: Vec<ManifestEntry>,
    pub finished_at: DateTime<Utc>,
}

impl RunManifest {
    fn new() -> Self {
        Self {
            complete: false,
            error: None,
            summary: RunSummary::default(),
            outputs: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    /// Write the manifest as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Cannot serialize manifest: {}", e)))?;
        fs::write(path, json)?;
        debug!(path = %path.display(), complete = self.complete, "Wrote run manifest");
        Ok(())
    }
}

/// Process every batch of `decoder` and write the configured indices.
///
/// When the configuration names a manifest path, the manifest is written
/// whether the run succeeds or not; a failed run is marked incomplete and
/// the original error is returned.
pub fn run<D, E, F>(
    decoder: D,
    encoder: &mut E,
    formulas: F,
    config: &ThermalConfig,
) -> Result<RunSummary>
where
    D: RecordDecoder,
    E: RecordEncoder<D::Handle>,
    F: ThermalFormulas,
{
    let mut manifest = RunManifest::new();
    let result = run_batches(decoder, encoder, formulas, config, &mut manifest);

    if let Some(path) = &config.manifest_path {
        manifest.complete = result.is_ok();
        manifest.error = result.as_ref().err().map(|e| e.to_string());
        manifest.finished_at = Utc::now();
        match (&result, manifest.write(path)) {
            (Ok(_), Err(e)) => return Err(e),
            (Err(_), Err(e)) => warn!(error = %e, "Failed to write run manifest"),
            _ => {}
        }
    }
    result
}

fn run_batches<D, E, F>(
    decoder: D,
    encoder: &mut E,
    formulas: F,
    config: &ThermalConfig,
    manifest: &mut RunManifest,
) -> Result<RunSummary>
where
    D: RecordDecoder,
    E: RecordEncoder<D::Handle>,
    F: ThermalFormulas,
{
    let validator = BatchValidator::new(config.required_fields.iter().cloned());
    let pipeline = IndexPipeline::new(formulas, config.fields.clone(), &config.outputs);
    let mut aggregator = BatchAggregator::new(decoder);

    info!(
        required = validator.required_count(),
        outputs = ?pipeline.outputs(),
        plan = ?pipeline.plan(),
        "Starting thermal index run"
    );

    let result = loop {
        let batch = match aggregator.next_batch() {
            Ok(Some(batch)) => batch,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        if let Err(e) = process_batch(batch, &validator, &pipeline, encoder, config, manifest) {
            break Err(e);
        }
    };
    manifest.summary.records_read = aggregator.stats().records_read;
    result?;
    encoder.finish()?;

    info!(
        records = manifest.summary.records_read,
        batches = manifest.summary.batches_read,
        skipped = manifest.summary.batches_skipped,
        messages = manifest.summary.messages_written,
        "Thermal index run complete"
    );
    Ok(manifest.summary)
}

fn process_batch<H, E, F>(
    batch: &Batch<H>,
    validator: &BatchValidator,
    pipeline: &IndexPipeline<F>,
    encoder: &mut E,
    config: &ThermalConfig,
    manifest: &mut RunManifest,
) -> Result<()>
where
    E: RecordEncoder<H>,
    F: ThermalFormulas,
{
    manifest.summary.batches_read += 1;

    if let Err(e) = validator.validate(batch) {
        match config.on_invalid_batch {
            InvalidBatchPolicy::Abort => return Err(e),
            InvalidBatchPolicy::Skip => {
                warn!(key = %batch.key(), error = %e, "Skipping invalid batch");
                manifest.summary.batches_skipped += 1;
                return Ok(());
            }
        }
    }

    let template = batch.get(&config.template_field).ok_or_else(|| {
        PipelineError::Config(format!(
            "template field '{}' missing from batch {}",
            config.template_field,
            batch.key()
        ))
    })?;

    for index in pipeline.run(batch)? {
        let target = index.kind.parameter();
        let bytes = encoder.encode(template, &target, &index.values)?;
        debug!(
            key = %batch.key(),
            index = %index.kind,
            param_id = target.id,
            bytes = bytes,
            "Wrote derived field"
        );
        manifest.outputs.push(ManifestEntry {
            key: batch.key(),
            index: index.kind,
            param_id: target.id,
            bytes,
        });
        manifest.summary.messages_written += 1;
        manifest.summary.bytes_written += bytes as u64;
    }
    manifest.summary.batches_processed += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_serializes_flat_entries() {
        let mut manifest = RunManifest::new();
        manifest.outputs.push(ManifestEntry {
            key: GroupKey { step: 6, member: 2 },
            index: IndexKind::Mrt,
            param_id: 261002,
            bytes: 120,
        });
        let json: serde_json::Value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["complete"], false);
        assert_eq!(json["outputs"][0]["step"], 6);
        assert_eq!(json["outputs"][0]["member"], 2);
        assert_eq!(json["outputs"][0]["index"], "mrt");
    }
}

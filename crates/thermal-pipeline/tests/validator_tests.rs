//! Validation of aggregated surface batches.

mod common;

use common::{decoder, record, surface_batch, ReleaseLog};
use thermal_pipeline::{BatchAggregator, BatchValidator, GridShape, PipelineError, ThermalConfig};

fn validator() -> BatchValidator {
    BatchValidator::new(ThermalConfig::default().required_fields)
}

#[test]
fn test_complete_surface_batch_is_valid() {
    let log = ReleaseLog::new();
    let mut aggregator = BatchAggregator::new(decoder(surface_batch(&log, 6, 0, &[])));
    let batch = aggregator.next_batch().unwrap().unwrap();
    assert!(validator().validate(batch).is_ok());
}

#[test]
fn test_missing_dewpoint_reported() {
    let log = ReleaseLog::new();
    let mut aggregator = BatchAggregator::new(decoder(surface_batch(&log, 6, 0, &["2d"])));
    let batch = aggregator.next_batch().unwrap().unwrap();
    assert_eq!(batch.len(), 8);

    match validator().validate(batch) {
        Err(PipelineError::BatchIncomplete {
            key,
            missing,
            unexpected,
        }) => {
            assert_eq!(key, batch.key());
            assert_eq!(missing, vec!["2d"]);
            assert!(unexpected.is_empty());
        }
        other => panic!("expected incomplete batch, got {:?}", other),
    }
}

#[test]
fn test_single_record_batch_is_incomplete() {
    let log = ReleaseLog::new();
    let records = vec![record(&log, "2t", 6, 0, vec![300.0; 4])];
    let mut aggregator = BatchAggregator::new(decoder(records));
    let batch = aggregator.next_batch().unwrap().unwrap();

    let err = validator().validate(batch).unwrap_err();
    match err {
        PipelineError::BatchIncomplete { ref missing, .. } => assert_eq!(missing.len(), 8),
        ref other => panic!("expected incomplete batch, got {}", other),
    }
    assert!(err.to_string().starts_with("Incomplete batch step=6 member=0"));
}

#[test]
fn test_extra_field_is_unexpected() {
    let log = ReleaseLog::new();
    let mut records = surface_batch(&log, 6, 0, &[]);
    records.push(record(&log, "sp", 6, 0, vec![101325.0; 4]));
    let mut aggregator = BatchAggregator::new(decoder(records));
    let batch = aggregator.next_batch().unwrap().unwrap();

    match validator().validate(batch) {
        Err(PipelineError::BatchIncomplete {
            missing,
            unexpected,
            ..
        }) => {
            assert!(missing.is_empty());
            assert_eq!(unexpected, vec!["sp"]);
        }
        other => panic!("expected incomplete batch, got {:?}", other),
    }
}

#[test]
fn test_transposed_grid_is_inconsistent() {
    let log = ReleaseLog::new();
    let mut records = surface_batch(&log, 6, 0, &[]);
    // Same point count, different layout
    records[4].shape = GridShape::new(4, 1);
    let name = records[4].short_name.clone();
    let mut aggregator = BatchAggregator::new(decoder(records));
    let batch = aggregator.next_batch().unwrap().unwrap();

    match validator().validate(batch) {
        Err(PipelineError::BatchInconsistent {
            field,
            property,
            expected,
            found,
            ..
        }) => {
            assert_eq!(field, name);
            assert_eq!(property, "grid shape");
            assert_eq!(expected, "2x2");
            assert_eq!(found, "4x1");
        }
        other => panic!("expected inconsistent batch, got {:?}", other),
    }
}

#[test]
fn test_mismatched_lengths_fail_at_decode() {
    let log = ReleaseLog::new();
    let mut records = surface_batch(&log, 6, 0, &[]);
    records[0].values.pop();
    let mut aggregator = BatchAggregator::new(decoder(records));
    assert!(matches!(
        aggregator.next_batch(),
        Err(PipelineError::Decode(_))
    ));
}

#[test]
fn test_validation_is_idempotent() {
    let log = ReleaseLog::new();
    let mut aggregator = BatchAggregator::new(decoder(surface_batch(&log, 6, 0, &["ssr", "str"])));
    let batch = aggregator.next_batch().unwrap().unwrap();
    let validator = validator();

    let first = validator.validate(batch).unwrap_err().to_string();
    let second = validator.validate(batch).unwrap_err().to_string();
    assert_eq!(first, second);
    assert_eq!(batch.len(), 7);
}

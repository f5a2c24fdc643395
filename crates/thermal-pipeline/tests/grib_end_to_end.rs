//! Full runs over GRIB2 files with the bundled formulas.

use std::path::Path;

use grib2_parser::{Grib2Builder, Grib2Reader, Grib2Tables};
use test_utils::{is_flux_field, surface_field_code, temp_file_with, typical_value, SURFACE_FIELDS};
use thermal_formulas::ReferenceFormulas;
use thermal_pipeline::{
    run, GribRecordDecoder, GribRecordEncoder, IndexKind, PipelineError, ThermalConfig,
};

const NI: u32 = 3;
const NJ: u32 = 2;

/// One GRIB2 message per surface field for a single (step, member) group.
fn surface_messages(step: u32, member: u8, omit: &[&str]) -> Vec<u8> {
    let mut stream = Vec::new();
    for name in SURFACE_FIELDS.iter().filter(|name| !omit.contains(*name)) {
        let (discipline, category, number) = surface_field_code(name).unwrap();
        let values: Vec<f64> = (0..NI * NJ)
            .map(|i| {
                let value = typical_value(name) + i as f64;
                if is_flux_field(name) {
                    value * step as f64 * 3600.0
                } else {
                    value
                }
            })
            .collect();

        let mut builder = Grib2Builder::new(NI, NJ)
            .with_parameter(discipline, category, number)
            .with_reference_time(2024, 7, 1, 12, 0)
            .with_forecast_hour(step)
            .with_ensemble_member(member, 51)
            .with_data(values);
        if is_flux_field(name) {
            builder = builder.accumulated();
        }
        stream.extend(builder.build().unwrap());
    }
    stream
}

fn run_file(input: &Path, output: &Path, config: &ThermalConfig) -> thermal_pipeline::Result<()> {
    let tables = config.grib_tables();
    let decoder = GribRecordDecoder::open(input, tables.clone())?;
    let mut encoder = GribRecordEncoder::create(output, tables)?;
    run(decoder, &mut encoder, ReferenceFormulas, config)?;
    Ok(())
}

fn read_output(path: &Path) -> Vec<(String, Option<u32>, u32, Vec<f64>)> {
    let data = std::fs::read(path).unwrap();
    let mut reader = Grib2Reader::new(&data[..], Grib2Tables::ecmwf_surface());
    let mut messages = Vec::new();
    while let Some(message) = reader.next_message().unwrap() {
        messages.push((
            message.short_name().to_string(),
            message.product_definition.parameter_id,
            message.product_definition.member(),
            message.unpack_data().unwrap(),
        ));
    }
    messages
}

#[test]
fn test_mrt_written_per_member() {
    let mut input = surface_messages(6, 0, &[]);
    input.extend(surface_messages(6, 1, &[]));
    let input = temp_file_with(&input);
    let output = tempfile::NamedTempFile::new().unwrap();

    run_file(input.path(), output.path(), &ThermalConfig::default()).unwrap();

    let messages = read_output(output.path());
    assert_eq!(messages.len(), 2);
    for (member, (name, param_id, found_member, values)) in messages.iter().enumerate() {
        assert_eq!(name, "mrt");
        assert_eq!(*param_id, Some(261002));
        assert_eq!(*found_member, member as u32);
        assert_eq!(values.len(), (NI * NJ) as usize);
        // Summer afternoon in central Europe
        for v in values {
            assert!(v.is_finite());
            assert!(*v > 250.0 && *v < 400.0, "implausible mrt {}", v);
        }
    }
}

#[test]
fn test_every_closed_form_index() {
    let input = temp_file_with(&surface_messages(6, 0, &[]));
    let output = tempfile::NamedTempFile::new().unwrap();
    let config = ThermalConfig {
        outputs: vec![
            IndexKind::ApparentTemperature,
            IndexKind::Mrt,
            IndexKind::WindSpeed,
            IndexKind::Cossza,
        ],
        ..ThermalConfig::default()
    };

    run_file(input.path(), output.path(), &config).unwrap();

    let messages = read_output(output.path());
    let names: Vec<&str> = messages.iter().map(|m| m.0.as_str()).collect();
    assert_eq!(names, vec!["cossza", "ws", "mrt", "aptmp"]);

    // 10u = 3 + i, 10v = 4 + i
    let ws = &messages[1].3;
    for (i, v) in ws.iter().enumerate() {
        let expected = ((3.0 + i as f64).powi(2) + (4.0 + i as f64).powi(2)).sqrt();
        assert!((v - expected).abs() < 1e-2, "ws[{}] = {}, expected {}", i, v, expected);
    }

    // Integrated over six afternoon hours, in seconds
    for v in &messages[0].3 {
        assert!(*v > 0.0 && *v < 6.0 * 3600.0);
    }
}

#[test]
fn test_utci_unavailable_in_bundled_formulas() {
    let input = temp_file_with(&surface_messages(6, 0, &[]));
    let output = tempfile::NamedTempFile::new().unwrap();
    let config = ThermalConfig {
        outputs: vec![IndexKind::Utci],
        ..ThermalConfig::default()
    };

    let err = run_file(input.path(), output.path(), &config).unwrap_err();
    match err {
        PipelineError::Derivation { index, .. } => assert_eq!(index, "utci"),
        other => panic!("expected derivation error, got {}", other),
    }
}

#[test]
fn test_missing_field_leaves_no_messages() {
    let input = temp_file_with(&surface_messages(6, 0, &["2d"]));
    let output = tempfile::NamedTempFile::new().unwrap();

    let err = run_file(input.path(), output.path(), &ThermalConfig::default()).unwrap_err();

    assert!(matches!(err, PipelineError::BatchIncomplete { .. }));
    assert!(read_output(output.path()).is_empty());
}

#[test]
fn test_unrepresentable_valid_time_is_error() {
    let mut stream = Vec::new();
    for name in SURFACE_FIELDS {
        let (discipline, category, number) = surface_field_code(name).unwrap();
        let message = Grib2Builder::new(NI, NJ)
            .with_parameter(discipline, category, number)
            .with_reference_time(2024, 7, 1, 23, 0)
            .with_forecast_hour(u32::MAX)
            .with_constant_value(typical_value(name))
            .build()
            .unwrap();
        stream.extend(message);
    }
    let input = temp_file_with(&stream);
    let output = tempfile::NamedTempFile::new().unwrap();

    let err = run_file(input.path(), output.path(), &ThermalConfig::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)), "got {}", err);
    assert!(read_output(output.path()).is_empty());
}

#[test]
fn test_truncated_input_is_decode_error() {
    let stream = surface_messages(6, 0, &[]);
    let input = temp_file_with(&stream[..stream.len() - 10]);
    let output = tempfile::NamedTempFile::new().unwrap();

    let err = run_file(input.path(), output.path(), &ThermalConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
}

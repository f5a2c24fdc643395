//! Common test fixtures for surface-field batches.

use std::io::Write;

use tempfile::NamedTempFile;

/// Short names of the nine fields that make up a complete surface batch.
pub const SURFACE_FIELDS: [&str; 9] = ["2t", "2d", "10u", "10v", "ssrd", "ssr", "fdir", "strd", "str"];

/// Accumulated radiation fields, scaled by the step length before use.
pub const FLUX_FIELDS: [&str; 5] = ["ssrd", "ssr", "fdir", "strd", "str"];

/// GRIB2 (discipline, category, number) for each surface field.
pub fn surface_field_code(short_name: &str) -> Option<(u8, u8, u8)> {
    match short_name {
        "2t" => Some((0, 0, 0)),
        "2d" => Some((0, 0, 6)),
        "10u" => Some((0, 2, 2)),
        "10v" => Some((0, 2, 3)),
        "ssrd" => Some((0, 4, 7)),
        "ssr" => Some((0, 4, 9)),
        "fdir" => Some((0, 4, 13)),
        "strd" => Some((0, 5, 3)),
        "str" => Some((0, 5, 5)),
        _ => None,
    }
}

/// Whether the field is accumulated over the forecast step.
pub fn is_flux_field(short_name: &str) -> bool {
    FLUX_FIELDS.contains(&short_name)
}

/// Representative mean value of each field: Kelvin, m/s or W m-2.
pub fn typical_value(short_name: &str) -> f64 {
    match short_name {
        "2t" => 300.0,
        "2d" => 290.0,
        "10u" => 3.0,
        "10v" => 4.0,
        "ssrd" => 600.0,
        "ssr" => 480.0,
        "fdir" => 400.0,
        "strd" => 350.0,
        "str" => -60.0,
        _ => 0.0,
    }
}

/// Write bytes to a named temporary file, kept alive by the returned handle.
pub fn temp_file_with(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

//! GRIB2 section parsing.
//!
//! This module handles parsing of individual GRIB2 message sections.
//! Each GRIB2 message consists of multiple sections containing
//! metadata, grid information, and packed data.
//!
//! Offsets in comments are 1-based octets as in the WMO manual; the code
//! indexes 0-based.

use crate::tables::Grib2Tables;
use crate::Grib2Error;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};

/// Missing value marker for 4-octet unsigned fields.
pub const MISSING_U32: u32 = u32::MAX;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub table_version: u8,
    pub local_table_version: u8,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

impl Identification {
    /// Reference time of day encoded as `hhmm` (e.g. 1200 for 12 UTC).
    pub fn time_of_day(&self) -> u32 {
        use chrono::Timelike;
        self.reference_time.hour() * 100 + self.reference_time.minute()
    }
}

/// Section 3: Grid Definition Section (template 3.0, regular lat/lon)
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template: u16,
    pub num_data_points: u32,
    pub shape_of_earth: u8,
    /// Ni - number of points along a parallel
    pub ni: u32,
    /// Nj - number of points along a meridian
    pub nj: u32,
    pub first_latitude: f64,
    pub first_longitude: f64,
    pub last_latitude: f64,
    pub last_longitude: f64,
    /// Di in degrees
    pub i_increment: f64,
    /// Dj in degrees
    pub j_increment: f64,
    pub scanning_mode: u8,
}

impl GridDefinition {
    pub fn num_points(&self) -> usize {
        self.ni as usize * self.nj as usize
    }

    /// Points scan in the -i (westward) direction.
    pub fn i_negative(&self) -> bool {
        self.scanning_mode & 0x80 != 0
    }

    /// Points scan in the +j (northward) direction.
    pub fn j_positive(&self) -> bool {
        self.scanning_mode & 0x40 != 0
    }

    /// Adjacent points are consecutive in the j direction.
    pub fn j_consecutive(&self) -> bool {
        self.scanning_mode & 0x20 != 0
    }

    /// Latitude and longitude of every grid point, in data order.
    pub fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let ni = self.ni as usize;
        let nj = self.nj as usize;
        let di = if self.i_negative() { -self.i_increment } else { self.i_increment };
        let dj = if self.j_positive() { self.j_increment } else { -self.j_increment };

        let mut lats = Vec::with_capacity(ni * nj);
        let mut lons = Vec::with_capacity(ni * nj);
        let mut push = |i: usize, j: usize| {
            lats.push(self.first_latitude + j as f64 * dj);
            lons.push(self.first_longitude + i as f64 * di);
        };

        if self.j_consecutive() {
            for i in 0..ni {
                for j in 0..nj {
                    push(i, j);
                }
            }
        } else {
            for j in 0..nj {
                for i in 0..ni {
                    push(i, j);
                }
            }
        }
        (lats, lons)
    }
}

/// Ensemble member description (product templates 4.1 and 4.11)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleInfo {
    pub ensemble_type: u8,
    pub perturbation_number: u8,
    pub ensemble_size: u8,
}

/// Statistical processing time range (product templates 4.8 and 4.11)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticalRange {
    /// Code table 4.10 (1 = accumulation)
    pub process: u8,
    pub time_unit: u8,
    pub length: u32,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub parameter_id: Option<u32>,
    pub generating_process: u8,
    pub time_unit: u8,
    pub forecast_time: u32,
    pub level_type: u8,
    pub level_scale_factor: u8,
    pub level_value: u32,
    pub ensemble: Option<EnsembleInfo>,
    pub statistics: Option<StatisticalRange>,
}

impl ProductDefinition {
    /// Forecast step in hours.
    ///
    /// For statistically processed products this is the end of the
    /// processing interval, so a 0-6h accumulation reports step 6.
    pub fn step_hours(&self) -> Result<u32, Grib2Error> {
        let start = time_range_hours(self.time_unit, self.forecast_time)?;
        match self.statistics {
            Some(range) => start
                .checked_add(time_range_hours(range.time_unit, range.length)?)
                .ok_or_else(|| Grib2Error::InvalidSection {
                    section: 4,
                    reason: format!(
                        "Step {} + {} overflows hours",
                        self.forecast_time, range.length
                    ),
                }),
            None => Ok(start),
        }
    }

    /// Ensemble member number; deterministic products report 0.
    pub fn member(&self) -> u32 {
        self.ensemble
            .map(|e| e.perturbation_number as u32)
            .unwrap_or(0)
    }
}

/// Section 5: Data Representation Section (template 5.0, simple packing)
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    /// Number of packed values (points present in the bitmap)
    pub num_data_points: u32,
    pub template: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub indicator: u8,
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6: reserved
    // Octet 7: discipline
    // Octet 8: edition
    // Octets 9-16: total length of GRIB message (8-byte big-endian)
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    let mut length = [0u8; 8];
    length.copy_from_slice(&data[8..16]);

    Ok(Indicator {
        discipline,
        edition,
        message_length: u64::from_be_bytes(length),
    })
}

/// Parse Section 1 (Identification)
/// Located at offset 16 in the message
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    const OFFSET: usize = 16;

    if data.len() < OFFSET + 21 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "Not enough data".to_string(),
        });
    }
    if data[OFFSET + 4] != 1 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: format!("Expected section 1 after indicator, found {}", data[OFFSET + 4]),
        });
    }

    // Skip section header (4 bytes) and section number (1 byte)
    let sec_data = &data[OFFSET + 5..];

    let center = u16::from_be_bytes([sec_data[0], sec_data[1]]);
    let sub_center = u16::from_be_bytes([sec_data[2], sec_data[3]]);
    let table_version = sec_data[4];
    let local_table_version = sec_data[5];
    let significance_of_reference_time = sec_data[6];

    // Reference time
    let year = u16::from_be_bytes([sec_data[7], sec_data[8]]);
    let month = sec_data[9];
    let day = sec_data[10];
    let hour = sec_data[11];
    let minute = sec_data[12];
    let second = sec_data[13];

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    let reference_time = DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc);

    Ok(Identification {
        center,
        sub_center,
        table_version,
        local_table_version,
        significance_of_reference_time,
        reference_time,
        production_status: sec_data[14],
        data_type: sec_data[15],
    })
}

/// Parse Section 3 (Grid Definition)
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let (offset, length) = find_section(data, 3)?;
    let section_data = &data[offset..offset + length];

    if section_data.len() < 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    // Octet 6: source of grid definition
    // Octets 7-10: number of data points
    // Octet 11: number of octets for optional list
    // Octet 12: interpretation of optional list
    // Octets 13-14: grid definition template number
    let num_data_points = u32::from_be_bytes([
        section_data[6],
        section_data[7],
        section_data[8],
        section_data[9],
    ]);
    let template = u16::from_be_bytes([section_data[12], section_data[13]]);

    if template != 0 {
        return Err(Grib2Error::UnsupportedTemplate {
            section: 3,
            template,
        });
    }

    // Template 3.0: Latitude/longitude (equidistant cylindrical)
    //
    // Byte 0: Shape of the Earth (Table 3.2)
    // Bytes 1-15: Earth radius / axes (scale factor + scaled value)
    // Bytes 16-19: Ni - number of points along a parallel
    // Bytes 20-23: Nj - number of points along a meridian
    // Bytes 24-27: Basic angle of the initial production domain
    // Bytes 28-31: Subdivisions of basic angle
    // Bytes 32-35: La1 - latitude of first grid point
    // Bytes 36-39: Lo1 - longitude of first grid point
    // Byte 40: Resolution and component flags
    // Bytes 41-44: La2 - latitude of last grid point
    // Bytes 45-48: Lo2 - longitude of last grid point
    // Bytes 49-52: Di - i direction increment
    // Bytes 53-56: Dj - j direction increment
    // Byte 57: Scanning mode (flags)
    let gd = &section_data[14..];
    if gd.len() < 58 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!("Template 0 needs at least 58 bytes, got {}", gd.len()),
        });
    }

    let ni = read_u32(&gd[16..20]);
    let nj = read_u32(&gd[20..24]);
    let basic_angle = read_u32(&gd[24..28]);
    let subdivisions = read_u32(&gd[28..32]);

    // Coordinates default to microdegrees unless a basic angle is given
    let to_degrees = |value: f64| {
        if basic_angle == 0 || basic_angle == MISSING_U32 {
            value / 1e6
        } else if subdivisions == 0 || subdivisions == MISSING_U32 {
            value * basic_angle as f64
        } else {
            value * basic_angle as f64 / subdivisions as f64
        }
    };

    let la1 = to_degrees(decode_grib2_signed(&gd[32..36]) as f64);
    let lo1 = to_degrees(decode_grib2_signed(&gd[36..40]) as f64);
    let resolution_flags = gd[40];
    let la2 = to_degrees(decode_grib2_signed(&gd[41..45]) as f64);
    let lo2 = to_degrees(decode_grib2_signed(&gd[45..49]) as f64);
    let di_raw = read_u32(&gd[49..53]);
    let dj_raw = read_u32(&gd[53..57]);
    let scanning_mode = gd[57];

    if scanning_mode & 0x10 != 0 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Alternating row scanning is not supported".to_string(),
        });
    }
    if num_data_points as u64 != ni as u64 * nj as u64 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!(
                "Data point count {} does not match grid {}x{}",
                num_data_points, ni, nj
            ),
        });
    }

    let i_given = resolution_flags & 0x20 != 0 && di_raw != MISSING_U32;
    let j_given = resolution_flags & 0x10 != 0 && dj_raw != MISSING_U32;

    let i_increment = if i_given {
        to_degrees(di_raw as f64)
    } else {
        let mut span = (lo2 - lo1).abs();
        if scanning_mode & 0x80 == 0 && lo2 < lo1 {
            span = lo2 + 360.0 - lo1;
        }
        span_increment(span, ni)
    };
    let j_increment = if j_given {
        to_degrees(dj_raw as f64)
    } else {
        span_increment((la2 - la1).abs(), nj)
    };

    Ok(GridDefinition {
        template,
        num_data_points,
        shape_of_earth: gd[0],
        ni,
        nj,
        first_latitude: la1,
        first_longitude: lo1,
        last_latitude: la2,
        last_longitude: lo2,
        i_increment,
        j_increment,
        scanning_mode,
    })
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(
    data: &[u8],
    discipline: u8,
    tables: &Grib2Tables,
) -> Result<ProductDefinition, Grib2Error> {
    let (offset, length) = find_section(data, 4)?;
    let section_data = &data[offset..offset + length];

    if section_data.len() < 34 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 6-7: number of coordinate values after template
    // Octets 8-9: product definition template number
    // Octet 10: parameter category
    // Octet 11: parameter number
    // Octet 12: type of generating process
    // Octet 18: indicator of unit of time range
    // Octets 19-22: forecast time
    // Octet 23: type of first fixed surface
    // Octet 24: scale factor of first fixed surface
    // Octets 25-28: scaled value of first fixed surface
    let template = u16::from_be_bytes([section_data[7], section_data[8]]);
    let parameter_category = section_data[9];
    let parameter_number = section_data[10];
    let generating_process = section_data[11];
    let time_unit = section_data[17];
    let forecast_time = read_u32(&section_data[18..22]);
    let level_type = section_data[22];
    let level_scale_factor = section_data[23];
    let level_value = read_u32(&section_data[24..28]);

    let require = |needed: usize| -> Result<(), Grib2Error> {
        if section_data.len() < needed {
            Err(Grib2Error::InvalidSection {
                section: 4,
                reason: format!(
                    "Template 4.{} needs {} bytes, got {}",
                    template,
                    needed,
                    section_data.len()
                ),
            })
        } else {
            Ok(())
        }
    };

    let ensemble_at = |start: usize| EnsembleInfo {
        ensemble_type: section_data[start],
        perturbation_number: section_data[start + 1],
        ensemble_size: section_data[start + 2],
    };
    // Statistical block: end of interval (7), n ranges (1), missing (4),
    // then the first range: process, increment type, unit, length
    let statistics_at = |start: usize| StatisticalRange {
        process: section_data[start + 12],
        time_unit: section_data[start + 14],
        length: read_u32(&section_data[start + 15..start + 19]),
    };

    let (ensemble, statistics) = match template {
        0 => (None, None),
        1 => {
            require(37)?;
            (Some(ensemble_at(34)), None)
        }
        8 => {
            require(58)?;
            (None, Some(statistics_at(34)))
        }
        11 => {
            require(61)?;
            (Some(ensemble_at(34)), Some(statistics_at(37)))
        }
        other => {
            return Err(Grib2Error::UnsupportedTemplate {
                section: 4,
                template: other,
            })
        }
    };

    let entry = tables.get_parameter(discipline, parameter_category, parameter_number);

    Ok(ProductDefinition {
        template,
        parameter_category,
        parameter_number,
        parameter_short_name: tables.get_parameter_name(
            discipline,
            parameter_category,
            parameter_number,
        ),
        parameter_id: entry.map(|e| e.param_id),
        generating_process,
        time_unit,
        forecast_time,
        level_type,
        level_scale_factor,
        level_value,
        ensemble,
        statistics,
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let (offset, length) = find_section(data, 5)?;
    let section_data = &data[offset..offset + length];

    if section_data.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 6-9 [5-8]: Number of data points (N)
    // Octets 10-11 [9-10]: Data representation template number
    //
    // For Template 5.0 (simple packing):
    // Octets 12-15 [11-14]: Reference value (R) - IEEE 32-bit float
    // Octets 16-17 [15-16]: Binary scale factor (E) - sign-magnitude 16-bit
    // Octets 18-19 [17-18]: Decimal scale factor (D) - sign-magnitude 16-bit
    // Octet 20 [19]: Number of bits per packed value
    // Octet 21 [20]: Type of original field values
    let num_data_points = read_u32(&section_data[5..9]);
    let template = u16::from_be_bytes([section_data[9], section_data[10]]);

    if template != 0 {
        return Err(Grib2Error::UnsupportedTemplate {
            section: 5,
            template,
        });
    }

    let reference_value = f32::from_be_bytes([
        section_data[11],
        section_data[12],
        section_data[13],
        section_data[14],
    ]);

    Ok(DataRepresentation {
        num_data_points,
        template,
        reference_value,
        binary_scale_factor: decode_grib2_signed16(&section_data[15..17]),
        decimal_scale_factor: decode_grib2_signed16(&section_data[17..19]),
        bits_per_value: section_data[19],
        original_data_type: section_data[20],
    })
}

/// Parse Section 6 (Bitmap)
///
/// Returns `None` when the indicator is 255 (no bitmap applies).
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let (offset, length) = find_section(data, 6)?;
    let section_data = &data[offset..offset + length];

    if section_data.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    match section_data[5] {
        255 => Ok(None),
        0 => Ok(Some(Bitmap {
            indicator: 0,
            data: Bytes::copy_from_slice(&section_data[6..]),
        })),
        other => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Unsupported bitmap indicator {}", other),
        }),
    }
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let (offset, length) = find_section(data, 7)?;

    let data_bytes = if length > 5 {
        Bytes::copy_from_slice(&data[offset + 5..offset + length])
    } else {
        Bytes::new()
    };

    Ok(DataSection { data: data_bytes })
}

// ===== Helper Functions =====

/// Byte ranges of every section after Section 0, as `(number, offset, length)`,
/// stopping at the end section.
pub fn section_layout(data: &[u8]) -> Result<Vec<(u8, usize, usize)>, Grib2Error> {
    let mut layout = Vec::new();
    let mut offset = 16; // After Section 0

    loop {
        if data.len() >= offset + 4 && &data[offset..offset + 4] == b"7777" {
            return Ok(layout);
        }
        if offset + 5 > data.len() {
            return Err(Grib2Error::InvalidFormat(
                "Reached end of message without end section".to_string(),
            ));
        }

        let section_length = read_u32(&data[offset..offset + 4]) as usize;
        let section_num = data[offset + 4];

        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        layout.push((section_num, offset, section_length));
        offset += section_length;
    }
}

/// Find a section by number within a message, returning `(offset, length)`.
fn find_section(data: &[u8], section_num: u8) -> Result<(usize, usize), Grib2Error> {
    section_layout(data)?
        .into_iter()
        .find(|(num, _, _)| *num == section_num)
        .map(|(_, offset, length)| (offset, length))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: section_num,
            reason: "Section not found".to_string(),
        })
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn span_increment(span: f64, points: u32) -> f64 {
    if points > 1 {
        span / (points - 1) as f64
    } else {
        0.0
    }
}

/// Convert a time range in the given unit (code table 4.4) to whole hours.
fn time_range_hours(unit: u8, value: u32) -> Result<u32, Grib2Error> {
    let whole = |divisor: u32| {
        if value % divisor == 0 {
            Ok(value / divisor)
        } else {
            Err(Grib2Error::InvalidSection {
                section: 4,
                reason: format!("Time range {} (unit {}) is not a whole hour", value, unit),
            })
        }
    };
    let scaled = |factor: u32| {
        value.checked_mul(factor).ok_or_else(|| Grib2Error::InvalidSection {
            section: 4,
            reason: format!("Time range {} (unit {}) overflows hours", value, unit),
        })
    };
    match unit {
        0 => whole(60),
        1 => Ok(value),
        2 => scaled(24),
        10 => scaled(3),
        11 => scaled(6),
        12 => scaled(12),
        13 => whole(3600),
        other => Err(Grib2Error::InvalidSection {
            section: 4,
            reason: format!("Unsupported time unit {}", other),
        }),
    }
}

/// Decode a 4-byte GRIB2 sign-magnitude integer.
///
/// The most significant bit is the sign, the remaining 31 bits the magnitude.
/// Slices of any other length decode to 0.
pub fn decode_grib2_signed(bytes: &[u8]) -> i32 {
    if bytes.len() != 4 {
        return 0;
    }
    let raw = read_u32(bytes);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Encode an integer as a 4-byte GRIB2 sign-magnitude value.
pub fn encode_grib2_signed(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 { magnitude | 0x8000_0000 } else { magnitude };
    raw.to_be_bytes()
}

/// Decode a 2-byte GRIB2 sign-magnitude integer (scale factors in Section 5).
pub fn decode_grib2_signed16(bytes: &[u8]) -> i16 {
    if bytes.len() != 2 {
        return 0;
    }
    let raw = u16::from_be_bytes([bytes[0], bytes[1]]);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Encode a 2-byte GRIB2 sign-magnitude value.
pub fn encode_grib2_signed16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_hours() {
        assert_eq!(time_range_hours(1, 6).unwrap(), 6);
        assert_eq!(time_range_hours(0, 360).unwrap(), 6);
        assert_eq!(time_range_hours(2, 1).unwrap(), 24);
        assert_eq!(time_range_hours(13, 21600).unwrap(), 6);
        assert!(time_range_hours(0, 90).is_err());
        assert!(time_range_hours(7, 1).is_err());
    }

    #[test]
    fn test_time_range_overflow_is_error() {
        assert_eq!(time_range_hours(2, u32::MAX / 24).unwrap(), u32::MAX / 24 * 24);
        assert!(matches!(
            time_range_hours(2, 200_000_000),
            Err(Grib2Error::InvalidSection { section: 4, .. })
        ));
        assert!(time_range_hours(12, u32::MAX).is_err());
    }

    #[test]
    fn test_grid_coordinates_north_to_south() {
        let grid = GridDefinition {
            template: 0,
            num_data_points: 6,
            shape_of_earth: 6,
            ni: 3,
            nj: 2,
            first_latitude: 50.0,
            first_longitude: 10.0,
            last_latitude: 49.0,
            last_longitude: 12.0,
            i_increment: 1.0,
            j_increment: 1.0,
            scanning_mode: 0,
        };
        let (lats, lons) = grid.coordinates();
        assert_eq!(lats, vec![50.0, 50.0, 50.0, 49.0, 49.0, 49.0]);
        assert_eq!(lons, vec![10.0, 11.0, 12.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_grid_coordinates_j_consecutive() {
        let grid = GridDefinition {
            template: 0,
            num_data_points: 4,
            shape_of_earth: 6,
            ni: 2,
            nj: 2,
            first_latitude: 0.0,
            first_longitude: 0.0,
            last_latitude: 1.0,
            last_longitude: 1.0,
            i_increment: 1.0,
            j_increment: 1.0,
            scanning_mode: 0x40 | 0x20,
        };
        let (lats, lons) = grid.coordinates();
        assert_eq!(lats, vec![0.0, 1.0, 0.0, 1.0]);
        assert_eq!(lons, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_signed16_roundtrip() {
        for value in [-32767i16, -5, -1, 0, 1, 12, 32767] {
            assert_eq!(decode_grib2_signed16(&encode_grib2_signed16(value)), value);
        }
        assert_eq!(encode_grib2_signed16(-3), [0x80, 0x03]);
    }
}

//! Builder for complete GRIB2 messages.
//!
//! Produces small but structurally valid messages on a regular lat/lon
//! grid. Used to create input fixtures and synthetic test files.

use chrono::{Duration, NaiveDate};

use crate::sections::encode_grib2_signed;
use crate::unpacking::{pack_simple, DEFAULT_BITS_PER_VALUE};
use crate::writer::{assemble, data_sections};
use crate::Grib2Error;

/// Build a GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    // Grid definition
    ni: u32,       // columns
    nj: u32,       // rows
    la1: i32,      // first lat (microdegrees)
    lo1: i32,      // first lon (microdegrees)
    increment: u32, // lat/lon increment (microdegrees)
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    ensemble: Option<(u8, u8)>,
    accumulated: bool,
    // Data
    data_values: Vec<f64>,
    bits_per_value: u8,
}

impl Grib2Builder {
    /// Create a builder for a 2m temperature field on an `ni` x `nj` grid.
    pub fn new(ni: u32, nj: u32) -> Self {
        Self {
            discipline: 0, // Meteorological
            center: 98,    // ECMWF
            year: 2024,
            month: 7,
            day: 1,
            hour: 0,
            minute: 0,
            ni,
            nj,
            la1: 50_000_000,  // 50.0°N
            lo1: 10_000_000,  // 10.0°E
            increment: 250_000, // 0.25°
            scanning_mode: 0, // +i, -j, i consecutive
            param_category: 0,
            param_number: 0, // 2t
            level_type: 103, // m above ground
            level_value: 2,
            forecast_hour: 0,
            ensemble: None,
            accumulated: false,
            data_values: vec![288.15; (ni * nj) as usize], // 15°C in Kelvin
            bits_per_value: DEFAULT_BITS_PER_VALUE,
        }
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self.minute = minute;
        self
    }

    /// Place the first grid point and set the spacing, in degrees.
    pub fn with_grid_origin(mut self, latitude: f64, longitude: f64, increment: f64) -> Self {
        self.la1 = (latitude * 1e6).round() as i32;
        self.lo1 = (longitude * 1e6).round() as i32;
        self.increment = (increment * 1e6).round() as u32;
        self
    }

    pub fn with_scanning_mode(mut self, scanning_mode: u8) -> Self {
        self.scanning_mode = scanning_mode;
        self
    }

    pub fn with_parameter(mut self, discipline: u8, category: u8, number: u8) -> Self {
        self.discipline = discipline;
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    /// Mark the field as one member of an ensemble (template 4.1 / 4.11).
    pub fn with_ensemble_member(mut self, member: u8, ensemble_size: u8) -> Self {
        self.ensemble = Some((member, ensemble_size));
        self
    }

    /// Mark the field as accumulated from the reference time up to the
    /// forecast hour (template 4.8 / 4.11).
    pub fn accumulated(mut self) -> Self {
        self.accumulated = true;
        self
    }

    pub fn with_constant_value(mut self, value: f64) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_data(mut self, data: Vec<f64>) -> Self {
        self.data_values = data;
        self
    }

    pub fn with_bits_per_value(mut self, bits_per_value: u8) -> Self {
        self.bits_per_value = bits_per_value;
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Result<Vec<u8>, Grib2Error> {
        let num_points = (self.ni * self.nj) as usize;
        if self.data_values.len() != num_points {
            return Err(Grib2Error::PackingError(format!(
                "Grid has {} points, got {} values",
                num_points,
                self.data_values.len()
            )));
        }

        let packed = pack_simple(&self.data_values, self.bits_per_value)?;

        let mut body = Vec::new();
        body.extend_from_slice(&self.build_section1());
        body.extend_from_slice(&self.build_section3());
        body.extend_from_slice(&self.build_section4()?);
        body.extend_from_slice(&data_sections(&packed, num_points));

        Ok(assemble(self.discipline, &body))
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1); // Section number

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(0); // Local table version
        section.push(1); // Reference time is start of forecast
        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(self.minute);
        section.push(0); // Second
        section.push(0); // Operational products
        section.push(1); // Forecast products
        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&72u32.to_be_bytes());
        section.push(3);
        section.push(0); // Source: code table 3.1
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // No optional list
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Spherical Earth, radius 6371229 m
        section.extend_from_slice(&[0u8; 15]);
        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&crate::sections::MISSING_U32.to_be_bytes());

        let j_step = if self.scanning_mode & 0x40 != 0 {
            self.increment as i64
        } else {
            -(self.increment as i64)
        };
        let i_step = if self.scanning_mode & 0x80 != 0 {
            -(self.increment as i64)
        } else {
            self.increment as i64
        };
        let la2 = self.la1 as i64 + j_step * (self.nj.saturating_sub(1)) as i64;
        let lo2 = self.lo1 as i64 + i_step * (self.ni.saturating_sub(1)) as i64;

        section.extend_from_slice(&encode_grib2_signed(self.la1));
        section.extend_from_slice(&encode_grib2_signed(self.lo1));
        section.push(0x30); // Di and Dj given
        section.extend_from_slice(&encode_grib2_signed(la2 as i32));
        section.extend_from_slice(&encode_grib2_signed(lo2 as i32));
        section.extend_from_slice(&self.increment.to_be_bytes());
        section.extend_from_slice(&self.increment.to_be_bytes());
        section.push(self.scanning_mode);
        section
    }

    fn build_section4(&self) -> Result<Vec<u8>, Grib2Error> {
        let template: u16 = match (self.ensemble.is_some(), self.accumulated) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 8,
            (true, true) => 11,
        };
        let forecast_time = if self.accumulated { 0 } else { self.forecast_hour };

        let mut section = Vec::new();
        section.extend_from_slice(&0u32.to_be_bytes()); // Length, patched below
        section.push(4);
        section.extend_from_slice(&0u16.to_be_bytes()); // No coordinate values
        section.extend_from_slice(&template.to_be_bytes());
        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Forecast
        section.push(0); // Background process
        section.push(0); // Analysis/forecast process
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Unit: hour
        section.extend_from_slice(&forecast_time.to_be_bytes());
        section.push(self.level_type);
        section.push(0);
        section.extend_from_slice(&self.level_value.to_be_bytes());
        section.push(255); // No second surface
        section.push(255);
        section.extend_from_slice(&crate::sections::MISSING_U32.to_be_bytes());

        if let Some((member, size)) = self.ensemble {
            section.push(if member == 0 { 0 } else { 3 }); // Control or perturbed
            section.push(member);
            section.push(size);
        }

        if self.accumulated {
            let end = NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
                .and_then(|d| d.and_hms_opt(self.hour as u32, self.minute as u32, 0))
                .and_then(|t| t.checked_add_signed(Duration::hours(self.forecast_hour as i64)))
                .ok_or_else(|| {
                    Grib2Error::PackingError(format!(
                        "Invalid end of interval {}-{:02}-{:02} + {}h",
                        self.year, self.month, self.day, self.forecast_hour
                    ))
                })?;
            use chrono::{Datelike, Timelike};
            section.extend_from_slice(&(end.year() as u16).to_be_bytes());
            section.push(end.month() as u8);
            section.push(end.day() as u8);
            section.push(end.hour() as u8);
            section.push(end.minute() as u8);
            section.push(0);
            section.push(1); // One time range
            section.extend_from_slice(&0u32.to_be_bytes()); // No missing values
            section.push(1); // Accumulation
            section.push(2); // Successive forecast times
            section.push(1); // Unit: hour
            section.extend_from_slice(&self.forecast_hour.to_be_bytes());
            section.push(255); // No increment
            section.extend_from_slice(&0u32.to_be_bytes());
        }

        let length = section.len() as u32;
        section[0..4].copy_from_slice(&length.to_be_bytes());
        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grib2Message, Grib2Tables};
    use bytes::Bytes;

    fn parse(raw: Vec<u8>) -> Grib2Message {
        Grib2Message::parse(Bytes::from(raw), &Grib2Tables::ecmwf_surface()).unwrap()
    }

    #[test]
    fn test_deterministic_instantaneous() {
        let message = parse(Grib2Builder::new(4, 3).with_forecast_hour(12).build().unwrap());
        let pd = &message.product_definition;
        assert_eq!(pd.template, 0);
        assert_eq!(pd.step_hours().unwrap(), 12);
        assert_eq!(pd.member(), 0);
        assert_eq!(message.grid_definition.num_points(), 12);
    }

    #[test]
    fn test_ensemble_accumulated() {
        let raw = Grib2Builder::new(2, 2)
            .with_parameter(0, 4, 7)
            .with_forecast_hour(6)
            .with_ensemble_member(5, 51)
            .accumulated()
            .build()
            .unwrap();
        let message = parse(raw);
        let pd = &message.product_definition;
        assert_eq!(pd.template, 11);
        assert_eq!(pd.forecast_time, 0);
        assert_eq!(pd.step_hours().unwrap(), 6);
        assert_eq!(pd.member(), 5);
        assert_eq!(message.short_name(), "ssrd");
    }

    #[test]
    fn test_accumulated_end_out_of_range() {
        let result = Grib2Builder::new(2, 2)
            .with_forecast_hour(u32::MAX)
            .accumulated()
            .build();
        assert!(matches!(result, Err(Grib2Error::PackingError(_))));
    }

    #[test]
    fn test_grid_coordinates() {
        let message = parse(
            Grib2Builder::new(2, 2)
                .with_grid_origin(-10.0, 350.0, 0.5)
                .build()
                .unwrap(),
        );
        assert_eq!(message.latitudes(), vec![-10.0, -10.0, -10.5, -10.5]);
        assert_eq!(message.longitudes(), vec![350.0, 350.5, 350.0, 350.5]);
    }

    #[test]
    fn test_wrong_value_count_rejected() {
        let result = Grib2Builder::new(2, 2).with_data(vec![1.0]).build();
        assert!(result.is_err());
    }
}

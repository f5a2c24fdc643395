//! GRIB2 reader and writer (WMO FM 92 GRIB Edition 2).
//!
//! This crate provides a pure Rust implementation of the GRIB2 subset used
//! for surface forecast fields:
//!
//! - Regular latitude/longitude grids (grid template 3.0)
//! - Instantaneous and accumulated products, deterministic or ensemble
//!   (product templates 4.0, 4.1, 4.8 and 4.11)
//! - Simple packing with optional bitmap (data representation template 5.0)
//!
//! Messages are read one at a time from any [`std::io::Read`] so a file of
//! concatenated messages never has to be held in memory at once.

pub mod builder;
pub mod sections;
pub mod tables;
pub mod unpacking;
pub mod writer;

use std::io::{ErrorKind, Read};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, trace};

pub use builder::Grib2Builder;
pub use sections::{
    Bitmap, DataRepresentation, DataSection, EnsembleInfo, GridDefinition, Identification,
    Indicator, ProductDefinition, StatisticalRange,
};
pub use tables::{Grib2Tables, ParamKey, ParameterEntry};
pub use writer::Grib2Writer;

/// Errors raised while reading or writing GRIB2 messages.
#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unsupported template {template} in section {section}")]
    UnsupportedTemplate { section: u8, template: u16 },

    #[error("Unpacking error: {0}")]
    UnpackingError(String),

    #[error("Packing error: {0}")]
    PackingError(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}

/// A fully parsed GRIB2 message.
///
/// The raw message bytes are kept alongside the parsed sections so that a
/// message can serve as a template for derived output (see [`Grib2Writer`]).
#[derive(Debug, Clone)]
pub struct Grib2Message {
    /// Byte offset of the message within its stream
    pub offset: u64,
    pub raw: Bytes,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
}

impl Grib2Message {
    /// Parse a complete message (Section 0 through the `7777` trailer).
    pub fn parse(raw: Bytes, tables: &Grib2Tables) -> Result<Self, Grib2Error> {
        let indicator = sections::parse_indicator(&raw)?;
        if indicator.message_length as usize != raw.len() {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message length {} does not match buffer length {}",
                indicator.message_length,
                raw.len()
            )));
        }
        if !raw.ends_with(b"7777") {
            return Err(Grib2Error::InvalidFormat(
                "Missing end section '7777'".to_string(),
            ));
        }

        let identification = sections::parse_identification(&raw)?;
        let grid_definition = sections::parse_grid_definition(&raw)?;
        let product_definition =
            sections::parse_product_definition(&raw, indicator.discipline, tables)?;
        let data_representation = sections::parse_data_representation(&raw)?;
        let bitmap = sections::parse_bitmap(&raw)?;
        let data_section = sections::parse_data_section(&raw)?;

        Ok(Self {
            offset: 0,
            raw,
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap,
            data_section,
        })
    }

    /// Parameter short name resolved through the lookup tables.
    pub fn short_name(&self) -> &str {
        &self.product_definition.parameter_short_name
    }

    /// Total number of grid points (Ni x Nj).
    pub fn num_points(&self) -> usize {
        self.grid_definition.num_points()
    }

    /// Unpack the data section into one value per grid point.
    ///
    /// Points masked out by the bitmap are returned as `NaN`.
    pub fn unpack_data(&self) -> Result<Vec<f64>, Grib2Error> {
        let dr = &self.data_representation;
        let values = unpacking::unpack_simple(
            &self.data_section.data,
            self.num_points(),
            dr.num_data_points as usize,
            dr.bits_per_value,
            dr.reference_value,
            dr.binary_scale_factor,
            dr.decimal_scale_factor,
            self.bitmap.as_ref().map(|b| b.data.as_ref()),
        )?;
        trace!(
            points = values.len(),
            param = %self.short_name(),
            "Unpacked GRIB2 data"
        );
        Ok(values)
    }

    /// Latitude of every grid point, in data order.
    pub fn latitudes(&self) -> Vec<f64> {
        self.grid_definition.coordinates().0
    }

    /// Longitude of every grid point, in data order.
    pub fn longitudes(&self) -> Vec<f64> {
        self.grid_definition.coordinates().1
    }
}

/// Streaming reader over a sequence of concatenated GRIB2 messages.
pub struct Grib2Reader<R> {
    reader: R,
    tables: Grib2Tables,
    offset: u64,
    messages_read: usize,
}

impl<R: Read> Grib2Reader<R> {
    pub fn new(reader: R, tables: Grib2Tables) -> Self {
        Self {
            reader,
            tables,
            offset: 0,
            messages_read: 0,
        }
    }

    /// Number of messages returned so far.
    pub fn messages_read(&self) -> usize {
        self.messages_read
    }

    pub fn tables(&self) -> &Grib2Tables {
        &self.tables
    }

    /// Read and parse the next message.
    ///
    /// Returns `Ok(None)` at a clean end of stream. A stream that ends in the
    /// middle of a message is an error.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, Grib2Error> {
        let mut header = [0u8; 16];
        let filled = read_up_to(&mut self.reader, &mut header)?;
        if filled == 0 {
            debug!(messages = self.messages_read, "Reached end of GRIB2 stream");
            return Ok(None);
        }
        if filled < header.len() {
            return Err(Grib2Error::InvalidFormat(format!(
                "Truncated indicator section at offset {}: {} of 16 bytes",
                self.offset, filled
            )));
        }

        let indicator = sections::parse_indicator(&header)?;
        let total = usize::try_from(indicator.message_length).map_err(|_| {
            Grib2Error::InvalidFormat(format!(
                "Message length {} exceeds addressable memory",
                indicator.message_length
            ))
        })?;
        if total < header.len() + 4 {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message length {} is too small",
                total
            )));
        }

        // Grow with the bytes actually present, not the declared length.
        let mut raw = Vec::with_capacity(header.len());
        raw.extend_from_slice(&header);
        (&mut self.reader)
            .take((total - header.len()) as u64)
            .read_to_end(&mut raw)?;
        if raw.len() < total {
            return Err(Grib2Error::InvalidFormat(format!(
                "Truncated message at offset {}: expected {} bytes, found {}",
                self.offset,
                total,
                raw.len()
            )));
        }

        let mut message = Grib2Message::parse(Bytes::from(raw), &self.tables)?;
        message.offset = self.offset;
        self.offset += total as u64;
        self.messages_read += 1;
        Ok(Some(message))
    }
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, Grib2Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Grib2Error::Io(e)),
        }
    }
    Ok(filled)
}

//! GRIB2 message writer.
//!
//! Derived fields are written by cloning a template message: the
//! identification, grid and product sections are copied verbatim (with the
//! parameter codes overridden) and the data sections are re-packed.

use std::io::Write;

use tracing::debug;

use crate::sections::section_layout;
use crate::unpacking::{pack_simple, PackedField, DEFAULT_BITS_PER_VALUE};
use crate::{Grib2Error, Grib2Message};

/// Streaming writer appending GRIB2 messages to any [`Write`].
pub struct Grib2Writer<W> {
    writer: W,
    bits_per_value: u8,
    messages_written: usize,
    bytes_written: u64,
}

impl<W: Write> Grib2Writer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bits_per_value: DEFAULT_BITS_PER_VALUE,
            messages_written: 0,
            bytes_written: 0,
        }
    }

    /// Packing precision for written values.
    pub fn with_bits_per_value(mut self, bits_per_value: u8) -> Self {
        self.bits_per_value = bits_per_value;
        self
    }

    pub fn messages_written(&self) -> usize {
        self.messages_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write a derived field using `template` for grid, date and step.
    ///
    /// Returns the number of bytes appended.
    pub fn write_derived(
        &mut self,
        template: &Grib2Message,
        discipline: u8,
        category: u8,
        number: u8,
        values: &[f64],
    ) -> Result<usize, Grib2Error> {
        let message = encode_derived(
            template,
            discipline,
            category,
            number,
            values,
            self.bits_per_value,
        )?;
        self.writer.write_all(&message)?;
        self.messages_written += 1;
        self.bytes_written += message.len() as u64;
        debug!(
            discipline = discipline,
            category = category,
            number = number,
            bytes = message.len(),
            "Wrote derived GRIB2 message"
        );
        Ok(message.len())
    }

    pub fn flush(&mut self) -> Result<(), Grib2Error> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, Grib2Error> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Encode a derived field as a complete message cloned from `template`.
pub fn encode_derived(
    template: &Grib2Message,
    discipline: u8,
    category: u8,
    number: u8,
    values: &[f64],
    bits_per_value: u8,
) -> Result<Vec<u8>, Grib2Error> {
    if values.len() != template.num_points() {
        return Err(Grib2Error::PackingError(format!(
            "Template grid has {} points, got {} values",
            template.num_points(),
            values.len()
        )));
    }

    let raw = &template.raw;
    let mut body = Vec::with_capacity(raw.len());
    for (num, offset, length) in section_layout(raw)? {
        if !(1..=4).contains(&num) {
            continue;
        }
        let start = body.len();
        body.extend_from_slice(&raw[offset..offset + length]);
        if num == 4 {
            body[start + 9] = category;
            body[start + 10] = number;
        }
    }

    let packed = pack_simple(values, bits_per_value)?;
    body.extend_from_slice(&data_sections(&packed, values.len()));

    Ok(assemble(discipline, &body))
}

/// Build Sections 5, 6 and 7 for a packed field.
pub(crate) fn data_sections(packed: &PackedField, num_points: usize) -> Vec<u8> {
    use crate::sections::encode_grib2_signed16;

    let mut out = Vec::new();

    // Section 5: Data Representation (template 5.0)
    out.extend_from_slice(&21u32.to_be_bytes());
    out.push(5);
    out.extend_from_slice(&packed.num_packed.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&packed.reference_value.to_be_bytes());
    out.extend_from_slice(&encode_grib2_signed16(packed.binary_scale_factor));
    out.extend_from_slice(&encode_grib2_signed16(packed.decimal_scale_factor));
    out.push(packed.bits_per_value);
    out.push(0); // Original values were floating point

    // Section 6: Bitmap
    match &packed.bitmap {
        Some(bitmap) => {
            debug_assert!(bitmap.len() * 8 >= num_points);
            out.extend_from_slice(&(6 + bitmap.len() as u32).to_be_bytes());
            out.push(6);
            out.push(0);
            out.extend_from_slice(bitmap);
        }
        None => {
            out.extend_from_slice(&6u32.to_be_bytes());
            out.push(6);
            out.push(255);
        }
    }

    // Section 7: Data
    out.extend_from_slice(&(5 + packed.data.len() as u32).to_be_bytes());
    out.push(7);
    out.extend_from_slice(&packed.data);

    out
}

/// Wrap Sections 1-7 with the indicator and end sections.
pub(crate) fn assemble(discipline: u8, body: &[u8]) -> Vec<u8> {
    let message_length = 16 + body.len() + 4;
    let mut message = Vec::with_capacity(message_length);

    message.extend_from_slice(b"GRIB");
    message.extend_from_slice(&[0, 0]); // Reserved
    message.push(discipline);
    message.push(2); // Edition 2
    message.extend_from_slice(&(message_length as u64).to_be_bytes());
    message.extend_from_slice(body);
    message.extend_from_slice(b"7777");

    message
}

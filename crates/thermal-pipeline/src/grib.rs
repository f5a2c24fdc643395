//! GRIB2 implementations of the decoder and encoder seams.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use grib2_parser::{Grib2Error, Grib2Message, Grib2Reader, Grib2Tables, Grib2Writer};
use tracing::{debug, trace};

use crate::error::{PipelineError, Result};
use crate::record::{GridShape, ParameterId, Record};
use crate::source::{RecordDecoder, RecordEncoder};

/// A decoded GRIB2 message kept open as the template for derived output.
#[derive(Debug)]
pub struct GribHandle {
    message: Grib2Message,
}

impl GribHandle {
    pub fn message(&self) -> &Grib2Message {
        &self.message
    }

    /// Byte offset of the message in its input stream.
    pub fn offset(&self) -> u64 {
        self.message.offset
    }
}

impl Drop for GribHandle {
    fn drop(&mut self) {
        trace!(
            offset = self.message.offset,
            param = %self.message.short_name(),
            "Released GRIB2 message"
        );
    }
}

fn decode_error(err: Grib2Error) -> PipelineError {
    PipelineError::Decode(err.to_string())
}

/// Reads GRIB2 messages and converts them into records.
pub struct GribRecordDecoder<R> {
    reader: Grib2Reader<R>,
}

impl GribRecordDecoder<BufReader<File>> {
    /// Open a GRIB2 file for decoding.
    pub fn open(path: &Path, tables: Grib2Tables) -> Result<Self> {
        let file = File::open(path)?;
        debug!(path = %path.display(), "Opened GRIB2 input");
        Ok(Self::new(BufReader::new(file), tables))
    }
}

impl<R: Read> GribRecordDecoder<R> {
    pub fn new(reader: R, tables: Grib2Tables) -> Self {
        Self {
            reader: Grib2Reader::new(reader, tables),
        }
    }

    pub fn messages_read(&self) -> usize {
        self.reader.messages_read()
    }
}

/// Convert a parsed message into a record that owns it.
pub fn record_from_message(message: Grib2Message) -> Result<Record<GribHandle>> {
    let grid = &message.grid_definition;
    let product = &message.product_definition;

    let step = product.step_hours().map_err(decode_error)?;
    let values = message.unpack_data().map_err(decode_error)?;
    let (latitudes, longitudes) = grid.coordinates();

    Ok(Record {
        short_name: message.short_name().to_string(),
        param_id: product.parameter_id,
        shape: GridShape::new(grid.ni, grid.nj),
        date: message.identification.reference_time.date_naive(),
        time: message.identification.time_of_day(),
        step,
        member: product.member(),
        latitudes,
        longitudes,
        values,
        handle: GribHandle { message },
    })
}

impl<R: Read> RecordDecoder for GribRecordDecoder<R> {
    type Handle = GribHandle;

    fn next_record(&mut self) -> Result<Option<Record<GribHandle>>> {
        match self.reader.next_message().map_err(decode_error)? {
            Some(message) => record_from_message(message).map(Some),
            None => Ok(None),
        }
    }
}

/// Writes derived fields as GRIB2 messages cloned from the template record.
pub struct GribRecordEncoder<W: Write> {
    writer: Grib2Writer<W>,
    tables: Grib2Tables,
}

impl GribRecordEncoder<BufWriter<File>> {
    /// Create (or truncate) a GRIB2 output file.
    pub fn create(path: &Path, tables: Grib2Tables) -> Result<Self> {
        let file = File::create(path)?;
        debug!(path = %path.display(), "Created GRIB2 output");
        Ok(Self::new(BufWriter::new(file), tables))
    }
}

impl<W: Write> GribRecordEncoder<W> {
    pub fn new(writer: W, tables: Grib2Tables) -> Self {
        Self {
            writer: Grib2Writer::new(writer),
            tables,
        }
    }

    pub fn messages_written(&self) -> usize {
        self.writer.messages_written()
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| PipelineError::Encode {
            index: "output".to_string(),
            reason: e.to_string(),
        })
    }
}

impl<W: Write> RecordEncoder<GribHandle> for GribRecordEncoder<W> {
    fn encode(
        &mut self,
        template: &Record<GribHandle>,
        target: &ParameterId,
        values: &[f64],
    ) -> Result<usize> {
        let encode_error = |reason: String| PipelineError::Encode {
            index: target.to_string(),
            reason,
        };
        let entry = self
            .tables
            .by_param_id(target.id)
            .ok_or_else(|| encode_error("no GRIB2 code for parameter".to_string()))?;

        self.writer
            .write_derived(
                template.handle.message(),
                entry.discipline,
                entry.category,
                entry.number,
                values,
            )
            .map_err(|e| encode_error(e.to_string()))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| PipelineError::Encode {
            index: "output".to_string(),
            reason: e.to_string(),
        })
    }
}

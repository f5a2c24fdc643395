//! Decoder and encoder seams.
//!
//! The pipeline only sees records through these traits, so the wire format
//! can be swapped (see [`crate::grib`]) or faked in tests.

use crate::error::Result;
use crate::record::{ParameterId, Record};

/// Produces decoded records one at a time from an open stream.
pub trait RecordDecoder {
    /// Native resource kept alive for each record until it is dropped.
    type Handle;

    /// Decode the next record, or `Ok(None)` at end of stream.
    ///
    /// Malformed input is an error; decoding does not resume afterwards.
    fn next_record(&mut self) -> Result<Option<Record<Self::Handle>>>;
}

/// Writes derived fields using a decoded record as template.
pub trait RecordEncoder<H> {
    /// Append one message carrying `values` under `target`, inheriting grid,
    /// date and step from `template`. Returns the number of bytes written.
    fn encode(&mut self, template: &Record<H>, target: &ParameterId, values: &[f64]) -> Result<usize>;

    /// Flush buffered output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Decoder over records that are already in memory.
pub struct IterDecoder<I> {
    records: I,
}

impl<I> IterDecoder<I> {
    pub fn new<T>(records: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter(),
        }
    }
}

impl<I, H> RecordDecoder for IterDecoder<I>
where
    I: Iterator<Item = Result<Record<H>>>,
{
    type Handle = H;

    fn next_record(&mut self) -> Result<Option<Record<H>>> {
        self.records.next().transpose()
    }
}

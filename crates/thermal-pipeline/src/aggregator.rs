//! Batch aggregation over a record stream.
//!
//! Records are grouped by [`GroupKey`] using adjacency only: a group ends
//! when a record with a different key arrives or the stream ends. The
//! aggregator owns every buffered record, and with it the decoder handle,
//! until the batch containing it has been handed out and the caller asks
//! for the next one.

use tracing::{debug, trace};

use crate::error::Result;
use crate::record::{Batch, GroupKey, Record};
use crate::source::RecordDecoder;

/// Counters maintained by [`BatchAggregator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    /// Records pulled from the decoder
    pub records_read: usize,
    /// Batches handed to the caller
    pub batches_yielded: usize,
    /// Records released after their batch was consumed
    pub records_released: usize,
}

/// Groups a flat record stream into contiguous batches.
///
/// [`next_batch`](Self::next_batch) lends out the completed batch; the
/// borrow must end before the next call, which releases it. The sequence
/// is finite and cannot be restarted: once it has ended, or failed, every
/// further call returns `Ok(None)`.
///
/// ```ignore
/// let mut aggregator = BatchAggregator::new(decoder);
/// while let Some(batch) = aggregator.next_batch()? {
///     validator.validate(batch)?;
/// }
/// ```
pub struct BatchAggregator<D: RecordDecoder> {
    decoder: D,
    /// Group being accumulated, or the group last handed out
    current: Batch<D::Handle>,
    /// First record of the next group, read while detecting the boundary
    pending: Option<Record<D::Handle>>,
    /// `current` has been handed out and is released on the next call
    lent: bool,
    finished: bool,
    stats: AggregatorStats,
}

impl<D: RecordDecoder> BatchAggregator<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            current: Batch::new(GroupKey { step: 0, member: 0 }),
            pending: None,
            lent: false,
            finished: false,
            stats: AggregatorStats::default(),
        }
    }

    pub fn stats(&self) -> AggregatorStats {
        self.stats
    }

    /// Whether the end of the stream (or a fatal error) has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pull records until a group is complete and lend it out.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. Decode errors and
    /// duplicate field names within a group are fatal.
    pub fn next_batch(&mut self) -> Result<Option<&Batch<D::Handle>>> {
        if self.lent {
            self.release_current();
            self.lent = false;
        }
        if self.finished {
            return Ok(None);
        }

        if let Some(record) = self.pending.take() {
            self.current = Batch::new(record.key());
            if let Err(e) = self.current.insert(record) {
                self.finished = true;
                return Err(e);
            }
        }

        loop {
            let record = match self.decoder.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    self.finished = true;
                    if self.current.is_empty() {
                        debug!(
                            records = self.stats.records_read,
                            batches = self.stats.batches_yielded,
                            "Record stream exhausted"
                        );
                        return Ok(None);
                    }
                    return Ok(Some(self.lend()));
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            };

            self.stats.records_read += 1;
            debug!(
                count = self.stats.records_read,
                step = record.step,
                member = record.member,
                param = %record.short_name,
                "Decoded record"
            );

            if let Err(e) = record.check_lengths() {
                self.finished = true;
                return Err(e);
            }

            let key = record.key();
            if self.current.is_empty() {
                self.current = Batch::new(key);
            } else if key != self.current.key() {
                self.pending = Some(record);
                return Ok(Some(self.lend()));
            }

            if let Err(e) = self.current.insert(record) {
                self.finished = true;
                return Err(e);
            }
        }
    }

    fn lend(&mut self) -> &Batch<D::Handle> {
        self.lent = true;
        self.stats.batches_yielded += 1;
        debug!(
            key = %self.current.key(),
            fields = self.current.len(),
            "Batch complete"
        );
        &self.current
    }

    fn release_current(&mut self) {
        let key = self.current.key();
        let released = self.current.clear();
        self.stats.records_released += released;
        trace!(key = %key, released = released, "Released batch records");
    }
}

impl<D: RecordDecoder> Drop for BatchAggregator<D> {
    fn drop(&mut self) {
        let buffered = self.current.len() + usize::from(self.pending.is_some());
        if buffered > 0 {
            trace!(records = buffered, "Releasing buffered records on drop");
        }
    }
}

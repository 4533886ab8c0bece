//! Ordered aggregator: the single writer of the output file.
//!
//! Segments arrive in any order. They are kept in an id-ordered buffer and, on
//! every flush, the contiguous run starting at `last_written_id + 1` is
//! appended to the file and removed from the buffer. Segments behind a gap
//! wait for the next flush; stale or duplicate deliveries are dropped on
//! arrival, so the buffer only ever holds the unresolved frontier.

use super::PipelineError;
use crate::segment::Segment;
use crate::storage::AppendWriter;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

/// What the aggregator wrote, and what it could not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    /// `None` when `start_id` was 0 and nothing was written.
    pub last_written_id: Option<u64>,
    pub segments_written: u64,
    pub bytes_written: u64,
    /// Segments still buffered behind a gap at shutdown. They are not written.
    pub stranded: usize,
    /// The id that never arrived, when `stranded > 0`.
    pub first_missing_id: Option<u64>,
    /// Stale or duplicate deliveries dropped on arrival.
    pub discarded: u64,
}

pub struct Aggregator {
    writer: AppendWriter,
    pending: BTreeMap<u64, Vec<u8>>,
    /// `last_written_id + 1`.
    next_id: u64,
    segments_written: u64,
    bytes_written: u64,
    discarded: u64,
}

impl Aggregator {
    pub fn new(writer: AppendWriter, start_id: u64) -> Self {
        Self {
            writer,
            pending: BTreeMap::new(),
            next_id: start_id,
            segments_written: 0,
            bytes_written: 0,
            discarded: 0,
        }
    }

    /// Starts at `start_id - 1`; `None` only for `start_id == 0` before any write.
    pub fn last_written_id(&self) -> Option<u64> {
        self.next_id.checked_sub(1)
    }

    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Buffer a segment. Returns false if it was stale or a duplicate.
    pub fn accept(&mut self, segment: Segment) -> bool {
        let Segment { id, payload } = segment;
        if id < self.next_id {
            tracing::debug!(id, next_id = self.next_id, "dropping already written segment");
            self.discarded += 1;
            return false;
        }
        match self.pending.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(payload);
                true
            }
            Entry::Occupied(_) => {
                tracing::debug!(id, "dropping duplicate segment");
                self.discarded += 1;
                false
            }
        }
    }

    /// Append the contiguous run starting at `last_written_id + 1`.
    /// Returns the number of segments written; the file is not opened when that is 0.
    pub async fn flush(&mut self) -> io::Result<usize> {
        if self.pending.first_key_value().map(|(id, _)| *id) != Some(self.next_id) {
            return Ok(0);
        }

        let mut cycle = self.writer.open().await?;
        let mut written = 0;
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.next_id {
                break;
            }
            let payload = entry.remove();
            cycle.append(&payload).await?;
            self.next_id += 1;
            self.segments_written += 1;
            self.bytes_written += payload.len() as u64;
            written += 1;
        }
        cycle.finish().await?;
        Ok(written)
    }

    pub fn report(&self) -> AggregateReport {
        let stranded = self.pending.len();
        AggregateReport {
            last_written_id: self.last_written_id(),
            segments_written: self.segments_written,
            bytes_written: self.bytes_written,
            stranded,
            first_missing_id: (stranded > 0).then_some(self.next_id),
            discarded: self.discarded,
        }
    }

    /// Receive segments until every sender is dropped, flushing every
    /// `flush_interval`, then run a final flush.
    pub async fn run(
        mut self,
        mut segments: mpsc::Receiver<Segment>,
        flush_interval: Duration,
    ) -> Result<AggregateReport, PipelineError> {
        let mut ticker = tokio::time::interval_at(Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = segments.recv() => match received {
                    Some(segment) => {
                        self.accept(segment);
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if self.pending.is_empty() {
                        tracing::trace!("no buffered segments");
                        continue;
                    }
                    let written = self.flush().await.map_err(|e| self.storage_error(e))?;
                    tracing::info!(
                        last_written_id = ?self.last_written_id(),
                        written,
                        buffered = self.pending.len(),
                        "flushed segments"
                    );
                }
            }
        }

        let written = self.flush().await.map_err(|e| self.storage_error(e))?;
        let report = self.report();
        tracing::info!(
            last_written_id = ?report.last_written_id,
            written,
            total = report.segments_written,
            bytes = report.bytes_written,
            "segment channel closed, final flush done"
        );
        if let Some(missing) = report.first_missing_id {
            tracing::warn!(
                missing,
                stranded = report.stranded,
                "segment never arrived; later segments were not written and the output is truncated"
            );
        }
        Ok(report)
    }

    fn storage_error(&self, source: io::Error) -> PipelineError {
        PipelineError::Storage {
            path: self.writer.path().to_path_buf(),
            source,
        }
    }
}

//! Row buffering and run accounting.

use shared_types::ParticipationRecord;
use vw_03_participation_store::WriteReport;

/// Accumulates whole blocks of rows until a row-count threshold is reached.
#[derive(Debug)]
pub struct RowBuffer {
    threshold: usize,
    rows: Vec<ParticipationRecord>,
}

impl RowBuffer {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            threshold,
            rows: Vec::with_capacity(threshold),
        }
    }

    /// Queue one block's rows. Returns a batch to flush once the buffer holds
    /// at least `threshold` rows.
    pub fn push(&mut self, block_rows: Vec<ParticipationRecord>) -> Option<Vec<ParticipationRecord>> {
        self.rows.extend(block_rows);
        if self.rows.len() >= self.threshold {
            Some(self.take())
        } else {
            None
        }
    }

    /// Drain whatever is buffered.
    pub fn take(&mut self) -> Vec<ParticipationRecord> {
        std::mem::replace(&mut self.rows, Vec::with_capacity(self.threshold))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Summary of one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Heights in the range.
    pub heights: u64,
    /// Blocks turned into rows.
    pub blocks: u64,
    /// Heights dropped (fetch error or no last-commit).
    pub skipped: u64,
    /// Buffer flushes handed to the store.
    pub flushes: usize,
    /// Statements and rows written across all flushes.
    pub written: WriteReport,
}

impl BackfillReport {
    pub fn record_flush(&mut self, write: WriteReport) {
        self.flushes += 1;
        self.written.merge(write);
    }
}

//! Batch results and summary statistics
//!
//! This module provides the unit returned to callers of the export parser and
//! the operator-facing summary derived from it.

use crate::app::models::{Header, MappedRecord, RawRow, RowSkipReason};
use serde::Serialize;
use std::sync::Arc;

/// Validated records and skip accounting for one parsed export
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Records that passed validation, in input order
    pub records: Vec<MappedRecord>,

    /// Number of rows mapped into records
    pub processed: usize,

    /// Number of rows left out of the batch
    pub skipped: usize,

    /// One reason per skipped row, in input order
    pub skip_reasons: Vec<RowSkipReason>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_record(&mut self, record: MappedRecord) {
        self.records.push(record);
        self.processed += 1;
    }

    pub(crate) fn push_skip(&mut self, reason: RowSkipReason) {
        self.skip_reasons.push(reason);
        self.skipped += 1;
    }

    /// Rows seen after assembly
    pub fn total_rows(&self) -> usize {
        self.processed + self.skipped
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_rows() == 0 {
            0.0
        } else {
            (self.processed as f64 / self.total_rows() as f64) * 100.0
        }
    }

    /// Operator-facing summary without the records themselves
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            processed: self.processed,
            skipped: self.skipped,
            skip_reasons: self.skip_reasons.clone(),
        }
    }
}

/// Batch summary surfaced to the invoking UI or CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub skip_reasons: Vec<RowSkipReason>,
}

/// Header and width-repaired, sanitized rows with no validation applied
#[derive(Debug, Clone, Default)]
pub struct RepairedTable {
    pub header: Arc<Header>,
    pub rows: Vec<RawRow>,
}

impl RepairedTable {
    pub fn width(&self) -> usize {
        self.header.width()
    }
}

//! Hand-off of validated records to persistence collaborators
//!
//! The parser performs no I/O against storage. Records leave the pipeline
//! through a [`RecordSink`], keyed by `(partition_key, record_id)` so the
//! receiving side can upsert idempotently.

use crate::app::models::{MappedRecord, RecordKey};
use crate::app::services::export_parser::BatchResult;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

/// Destination for validated records
pub trait RecordSink {
    /// Insert or replace the record stored under `key`
    fn upsert(&mut self, key: &RecordKey, record: &MappedRecord) -> Result<()>;
}

/// Hand every record of a batch to a sink, returning how many were written
pub fn deliver<S: RecordSink + ?Sized>(batch: &BatchResult, sink: &mut S) -> Result<usize> {
    for record in &batch.records {
        sink.upsert(record.key(), record)?;
    }
    debug!("Delivered {} records", batch.records.len());
    Ok(batch.records.len())
}

/// In-memory sink keyed like the persistence layer
///
/// Re-delivering a record with the same key replaces the stored copy.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: BTreeMap<RecordKey, MappedRecord>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&MappedRecord> {
        self.records.get(key)
    }

    /// Number of distinct keys stored
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of upserts received, including replacements
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.records.keys()
    }
}

impl RecordSink for MemorySink {
    fn upsert(&mut self, key: &RecordKey, record: &MappedRecord) -> Result<()> {
        self.records.insert(key.clone(), record.clone());
        self.writes += 1;
        Ok(())
    }
}

/// Writes one JSON object per record, newline delimited
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.writer
            .flush()
            .map_err(|e| Error::io("Failed to flush record stream", e))?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn upsert(&mut self, key: &RecordKey, record: &MappedRecord) -> Result<()> {
        // The record carries its own key and line number
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| Error::serialization(format!("Failed to write record {}", key), e))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::io("Failed to write record stream", e))?;
        self.written += 1;
        Ok(())
    }
}

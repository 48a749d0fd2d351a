//! Data models for PMS export processing
//!
//! This module contains the core data structures that flow through the repair
//! pipeline: the parsed header, assembled raw rows, normalized dates and the
//! validated records handed to downstream sinks.

use crate::constants::CANONICAL_DATE_FORMAT;
use chrono::{Datelike, NaiveDate};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Header
// =============================================================================

/// Ordered column names from the first non-blank line of an export
///
/// Names are not required to be unique; the first occurrence binds the name
/// for lookups. The header fixes the expected row width and is immutable once
/// parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    /// Build a header from already split column names
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(position);
        }
        Self { names, index }
    }

    /// Parse a header line, trimming every column name
    pub fn parse(line: &str, separator: char) -> Self {
        Self::new(
            line.split(separator)
                .map(|name| name.trim().to_string())
                .collect(),
        )
    }

    /// Column names in export order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Expected width of every finalized row
    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the first column carrying `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

// =============================================================================
// Raw Rows
// =============================================================================

/// A row of string cells produced by the record assembler
///
/// After finalization the number of cells always equals the header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based physical line number of the row's boundary line
    pub line_number: usize,

    /// Cell values in header order
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(line_number: usize, cells: Vec<String>) -> Self {
        Self { line_number, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

// =============================================================================
// Canonical Dates
// =============================================================================

/// An ISO 8601 calendar date (`YYYY-MM-DD`) produced by the date normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_DATE_FORMAT))
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Mapped Records
// =============================================================================

/// Persistence key for idempotent upserts downstream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    /// Canonical partition date, when a partition date field is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,

    /// Trimmed primary key value
    pub record_id: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.partition_key {
            Some(partition) => write!(f, "{}/{}", partition, self.record_id),
            None => write!(f, "{}", self.record_id),
        }
    }
}

/// A validated row bound to header names
///
/// Created only from a finalized, sanitized row that passed validation, so a
/// record is always complete.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    line_number: usize,
    header: Arc<Header>,
    cells: Vec<String>,
    key: RecordKey,
    dates: BTreeMap<String, CanonicalDate>,
}

impl MappedRecord {
    pub(crate) fn new(
        row: RawRow,
        header: Arc<Header>,
        key: RecordKey,
        dates: BTreeMap<String, CanonicalDate>,
    ) -> Self {
        Self {
            line_number: row.line_number,
            header,
            cells: row.cells,
            key,
            dates,
        }
    }

    /// Cell value for a header name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.header
            .position(name)
            .and_then(|index| self.cells.get(index))
            .map(String::as_str)
    }

    /// Normalized value of a configured date field
    pub fn date(&self, name: &str) -> Option<CanonicalDate> {
        self.dates.get(name).copied()
    }

    pub fn dates(&self) -> &BTreeMap<String, CanonicalDate> {
        &self.dates
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Cells in header order
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Name -> value view over a record, first occurrence of each name wins
struct FieldsView<'a>(&'a MappedRecord);

impl Serialize for FieldsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let header = &self.0.header;
        let mut map = serializer.serialize_map(None)?;
        for (position, (name, value)) in header.names().iter().zip(&self.0.cells).enumerate() {
            if header.position(name) == Some(position) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

impl Serialize for MappedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MappedRecord", 4)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("line", &self.line_number)?;
        state.serialize_field("fields", &FieldsView(self))?;
        state.serialize_field("dates", &self.dates)?;
        state.end()
    }
}

// =============================================================================
// Row Skip Reasons
// =============================================================================

/// Why a row was left out of a batch
///
/// These are recovered, row-level conditions; they never abort the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowSkipReason {
    /// The primary key cell was empty after trimming
    EmptyPrimaryKey { line: usize, field: String },

    /// A configured date field did not normalize to a calendar date
    MalformedDate {
        line: usize,
        field: String,
        value: String,
    },
}

impl RowSkipReason {
    /// Physical line number of the skipped row
    pub fn line(&self) -> usize {
        match self {
            Self::EmptyPrimaryKey { line, .. } | Self::MalformedDate { line, .. } => *line,
        }
    }
}

impl fmt::Display for RowSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPrimaryKey { line, field } => {
                write!(f, "line {}: empty primary key '{}'", line, field)
            }
            Self::MalformedDate { line, field, value } => {
                write!(f, "line {}: malformed date in '{}': '{}'", line, field, value)
            }
        }
    }
}

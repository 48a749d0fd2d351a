//! Row validation and mapping into keyed records
//!
//! Each finalized, sanitized row is either mapped into a complete
//! [`MappedRecord`] or skipped with a [`RowSkipReason`]. Nothing in between is
//! ever emitted.

use super::column_mapping::ColumnMapping;
use crate::app::models::{MappedRecord, RawRow, RecordKey, RowSkipReason};
use crate::app::services::date_normalizer;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Result of validating a single row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Mapped(MappedRecord),
    Skipped(RowSkipReason),
}

/// Validates rows against a resolved column mapping
#[derive(Debug)]
pub struct RecordMapper<'a> {
    mapping: &'a ColumnMapping,
}

impl<'a> RecordMapper<'a> {
    pub fn new(mapping: &'a ColumnMapping) -> Self {
        Self { mapping }
    }

    /// Map a row, or explain why it was skipped
    pub fn map_row(&self, row: RawRow) -> RowOutcome {
        let (key_field, key_index) = &self.mapping.primary_key;
        let record_id = row.get(*key_index).unwrap_or_default().trim().to_string();

        if record_id.is_empty() {
            debug!("Skipping line {}: empty primary key", row.line_number);
            return RowOutcome::Skipped(RowSkipReason::EmptyPrimaryKey {
                line: row.line_number,
                field: key_field.clone(),
            });
        }

        let mut dates = BTreeMap::new();
        for (field, index) in &self.mapping.date_fields {
            let value = row.get(*index).unwrap_or_default();
            match date_normalizer::normalize(value) {
                Ok(date) => {
                    dates.insert(field.clone(), date);
                }
                Err(e) => {
                    debug!("Skipping line {}: {}", row.line_number, e);
                    return RowOutcome::Skipped(RowSkipReason::MalformedDate {
                        line: row.line_number,
                        field: field.clone(),
                        value: value.trim().to_string(),
                    });
                }
            }
        }

        let partition_key = self
            .mapping
            .partition_date
            .as_ref()
            .and_then(|field| dates.get(field))
            .map(ToString::to_string);

        let key = RecordKey {
            partition_key,
            record_id,
        };

        RowOutcome::Mapped(MappedRecord::new(
            row,
            Arc::clone(&self.mapping.header),
            key,
            dates,
        ))
    }
}

//! Column binding between pipeline configuration and a parsed header
//!
//! This module resolves every configured column name to its header position
//! once per export, failing the whole batch when a required column is absent.

use super::assembler::{ContinuationTarget, RowShape};
use crate::app::models::Header;
use crate::config::PipelineConfig;
use crate::{Error, Result};
use std::sync::Arc;

/// Header positions for every configured column
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// The parsed export header
    pub header: Arc<Header>,

    /// Primary key field name and position
    pub primary_key: (String, usize),

    /// Date field names and positions, in configuration order
    pub date_fields: Vec<(String, usize)>,

    /// Partition date field name, when configured
    pub partition_date: Option<String>,

    /// Where continuation text is merged
    pub continuation_target: ContinuationTarget,

    /// Column cleaned by the field sanitizer
    pub free_text_index: usize,
}

impl ColumnMapping {
    /// Bind only the layout parameters needed for row repair
    ///
    /// Never fails; an unknown free-text column falls back to the last column.
    pub fn layout(header: &Header, config: &PipelineConfig) -> (ContinuationTarget, usize) {
        let configured = config
            .free_text_column
            .as_deref()
            .and_then(|name| header.position(name));

        match configured {
            Some(index) => (ContinuationTarget::Column(index), index),
            None => (
                ContinuationTarget::LastColumn,
                header.width().saturating_sub(1),
            ),
        }
    }

    /// Resolve configuration against the header
    ///
    /// Returns `MissingColumns` listing every absent name when any required
    /// column (required headers, primary key, date fields, free-text column)
    /// is not in the header.
    pub fn resolve(header: Arc<Header>, config: &PipelineConfig) -> Result<Self> {
        let missing: Vec<String> = config
            .required_columns()
            .into_iter()
            .filter(|name| !header.contains(name))
            .collect();

        if !missing.is_empty() {
            return Err(Error::missing_columns(missing));
        }

        let position = |name: &str| {
            header
                .position(name)
                .ok_or_else(|| Error::missing_columns(vec![name.to_string()]))
        };

        let primary_key = (
            config.primary_key_field.clone(),
            position(&config.primary_key_field)?,
        );

        let date_fields = config
            .date_fields
            .iter()
            .map(|name| Ok((name.clone(), position(name)?)))
            .collect::<Result<Vec<_>>>()?;

        let (continuation_target, free_text_index) = Self::layout(&header, config);

        Ok(Self {
            primary_key,
            date_fields,
            partition_date: config.partition_date_field.clone(),
            continuation_target,
            free_text_index,
            header,
        })
    }

    /// Row shape used by the assembler for this header
    pub fn row_shape(&self, separator: char) -> RowShape {
        RowShape {
            separator,
            width: self.header.width(),
            target: self.continuation_target,
        }
    }

    /// Get statistics about the column mapping
    pub fn stats(&self) -> (usize, usize) {
        (self.header.width(), self.date_fields.len())
    }
}

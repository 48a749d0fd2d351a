//! Repair and normalization pipeline for line-break corrupted PMS exports
//!
//! Property-management exports are nominally tab-separated, but upstream tools
//! embed raw line breaks inside free-text fields such as billing addresses.
//! This module rebuilds well-formed, fixed-width records from the physical
//! lines and maps them into validated records.
//!
//! ## Architecture
//!
//! The parser is organized into logical components:
//! - [`boundary`] - Line classification and swappable boundary detection
//! - [`assembler`] - Stateful row reconstruction and column-width repair
//! - [`sanitizer`] - Free-text column cleanup
//! - [`column_mapping`] - Binding configured column names to header positions
//! - [`record_mapper`] - Row validation and mapping into keyed records
//! - [`parser`] - Orchestration over in-memory text, readers and files
//! - [`stats`] - Batch results and summaries
//!
//! ## Usage
//!
//! ```rust
//! use pms_export_repair::{ExportParser, PipelineConfig};
//!
//! # fn example() -> pms_export_repair::Result<()> {
//! let config = PipelineConfig::default()
//!     .with_primary_key_field("Id")
//!     .with_free_text_column("Address");
//! let parser = ExportParser::new(config)?;
//!
//! let batch = parser.parse("\tId\tAddress\n\t1\t12 Main St\nApt 4\n")?;
//! assert_eq!(batch.processed, 1);
//! assert_eq!(batch.records[0].get("Address"), Some("12 Main St Apt 4"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod assembler;
pub mod boundary;
pub mod column_mapping;
pub mod parser;
pub mod record_mapper;
pub mod sanitizer;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use assembler::{ContinuationTarget, RecordAssembler, RowShape};
pub use boundary::{BoundaryDetector, LeadingSeparator, LineClass, LineClassifier, PatternBoundary};
pub use column_mapping::ColumnMapping;
pub use parser::ExportParser;
pub use stats::{BatchResult, BatchSummary, RepairedTable};

//! PMS Export Repair Library
//!
//! A Rust library for repairing property-management-system exports whose
//! tab-separated records have been broken across physical lines by raw line
//! breaks embedded in free-text fields.
//!
//! This library provides tools for:
//! - Classifying physical lines as record boundaries or continuations
//! - Reassembling fixed-width rows with column-width repair
//! - Sanitizing the free-text column of every finalized row
//! - Normalizing vendor date notations to ISO 8601 calendar dates
//! - Validating rows against the header and mapping them into keyed records
//! - Rendering repaired tables as fully quoted CSV documents

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod csv_renderer;
        pub mod date_normalizer;
        pub mod export_parser;
        pub mod record_sink;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{CanonicalDate, Header, MappedRecord, RawRow, RecordKey, RowSkipReason};
pub use app::services::export_parser::{BatchResult, BatchSummary, ExportParser, RepairedTable};
pub use config::PipelineConfig;

use std::path::PathBuf;

/// Result type alias for the export repair pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for export repair operations
///
/// Row-level problems (empty primary key, malformed date) are not errors:
/// they are recorded as [`RowSkipReason`]s and never abort a batch.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input could not be read before parsing started
    #[error("Unreadable input '{}': {source}", path.display())]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The header lacks one or more required columns; no row was processed
    #[error("Missing required columns: {}", names.join(", "))]
    MissingColumns { names: Vec<String> },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be parsed
    #[error("Invalid configuration file '{}': {source}", path.display())]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Boundary pattern failed to compile
    #[error("Invalid boundary pattern '{pattern}': {source}")]
    InvalidBoundaryPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Quoted CSV rendering failed
    #[error("Rendering error: {message}")]
    Rendering {
        message: String,
        #[source]
        source: csv::Error,
    },

    /// Record serialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an unreadable input error
    pub fn unreadable_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::UnreadableInput {
            path: path.into(),
            source,
        }
    }

    /// Create a missing columns error
    pub fn missing_columns(names: Vec<String>) -> Self {
        Self::MissingColumns { names }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid boundary pattern error
    pub fn invalid_boundary_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidBoundaryPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a rendering error with context
    pub fn rendering(message: impl Into<String>, source: csv::Error) -> Self {
        Self::Rendering {
            message: message.into(),
            source,
        }
    }

    /// Create a serialization error with context
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Header-level failures abort a whole batch
    pub fn is_header_failure(&self) -> bool {
        matches!(self, Self::MissingColumns { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Rendering {
            message: "CSV rendering failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON serialization failed".to_string(),
            source: error,
        }
    }
}

//! Application constants for the PMS export repair pipeline
//!
//! This module contains default values, vendor notations and file naming
//! conventions used throughout the crate.

// =============================================================================
// Export Format
// =============================================================================

/// Field separator used by the vendor export
pub const DEFAULT_SEPARATOR: char = '\t';

/// Characters the sanitizer collapses inside the free-text column
pub const LINE_BREAK_CHARS: &[char] = &['\r', '\n'];

/// Default primary key column in reservation exports
pub const DEFAULT_PRIMARY_KEY_FIELD: &str = "Confirmation Number";

/// Three-letter English month abbreviations, January first
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Century added to two-digit years (`24` -> `2024`)
pub const TWO_DIGIT_YEAR_BASE: i32 = 2000;

/// Canonical date rendering (ISO 8601 calendar date)
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Rendering
// =============================================================================

/// Row terminator used by the quoted CSV renderer
pub const CRLF: &str = "\r\n";

/// Suffix appended to repaired documents written next to their input
pub const REPAIRED_FILE_SUFFIX: &str = ".repaired.csv";

/// Suffix appended to keyed record streams written next to their input
pub const RECORDS_FILE_SUFFIX: &str = ".records.jsonl";

/// Suffix for the quoted CSV of validated records
pub const VALIDATED_FILE_SUFFIX: &str = ".validated.csv";

/// File extensions picked up when an input path is a directory
pub const EXPORT_FILE_EXTENSIONS: &[&str] = &["txt", "tsv", "csv"];

// =============================================================================
// Application
// =============================================================================

/// Directory name used under the platform config dir
pub const APP_CONFIG_DIR: &str = "pms-export-repair";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Log target used when building the default env filter
pub const LOG_TARGET: &str = "pms_export_repair";

/// Default parallel workers (0 = one per logical CPU)
pub const DEFAULT_PARALLEL_WORKERS: usize = 0;

/// Upper bound on configured parallel workers
pub const MAX_PARALLEL_WORKERS: usize = 64;

//! Command-line argument definitions for the PMS export repair tool
//!
//! This module defines the complete CLI interface using clap derive API.

use crate::config::BoundaryConfig;
use crate::constants::{DEFAULT_PARALLEL_WORKERS, MAX_PARALLEL_WORKERS};
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the PMS export repair tool
///
/// Reassembles tab-separated property-management-system exports whose
/// records were split across lines by raw line breaks in free-text fields.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pms-export-repair",
    version,
    about = "Repair line-break corrupted PMS exports and extract keyed records",
    long_about = "Reassembles tab-separated property-management-system exports whose records \
                  were broken across physical lines by raw line breaks in free-text fields. \
                  Emits cleaned, fully quoted CSV documents or validated records keyed by \
                  partition date and primary key."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Reassemble rows and write cleaned, fully quoted CSV
    Repair(RepairArgs),
    /// Validate rows and write keyed records as JSON lines
    Ingest(IngestArgs),
}

/// Arguments for the repair command
#[derive(Debug, Clone, Parser)]
pub struct RepairArgs {
    #[command(flatten)]
    pub export: ExportArgs,
}

/// Arguments for the ingest command
#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Also write validated records as quoted CSV
    ///
    /// Written next to the JSON lines output with a `.validated.csv` suffix.
    #[arg(long = "csv", help = "Also write validated records as quoted CSV")]
    pub write_csv: bool,
}

/// Options shared by every command that reads exports
#[derive(Debug, Clone, ClapArgs)]
pub struct ExportArgs {
    /// Export files or directories to process
    ///
    /// Directories are searched recursively for .txt, .tsv and .csv files.
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output directory for generated files
    ///
    /// If not specified, outputs are written next to each input file.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output directory for generated files"
    )]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config dir>/pms-export-repair/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Field separator (a single character, or `tab`)
    #[arg(
        long = "separator",
        value_name = "CHAR",
        value_parser = parse_separator,
        help = "Field separator (single character or 'tab')"
    )]
    pub separator: Option<char>,

    /// Column receiving continuation text and line-break sanitizing
    #[arg(
        long = "free-text-column",
        value_name = "NAME",
        help = "Column that receives continuation text"
    )]
    pub free_text_column: Option<String>,

    #[arg(
        long = "primary-key",
        value_name = "NAME",
        help = "Primary key column name"
    )]
    pub primary_key: Option<String>,

    #[arg(
        long = "date-fields",
        value_name = "LIST",
        help = "Comma-separated list of date columns to normalize"
    )]
    pub date_fields: Option<FieldList>,

    /// Date column whose canonical value partitions the records
    ///
    /// Must be one of the date fields.
    #[arg(
        long = "partition-field",
        value_name = "NAME",
        help = "Date column used as the partition key"
    )]
    pub partition_field: Option<String>,

    #[arg(
        long = "required",
        value_name = "LIST",
        help = "Comma-separated list of columns the header must contain"
    )]
    pub required: Option<FieldList>,

    /// Regular expression identifying record boundary lines
    ///
    /// Replaces the default rule (a line starting with the separator).
    #[arg(
        long = "boundary-pattern",
        value_name = "REGEX",
        help = "Regex that matches the first line of every record"
    )]
    pub boundary_pattern: Option<String>,

    /// Number of files processed concurrently (0 = one per CPU)
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        default_value_t = DEFAULT_PARALLEL_WORKERS,
        help = "Number of files processed concurrently (0 = one per CPU)"
    )]
    pub workers: usize,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors and the final summary. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for the summary"
    )]
    pub output_format: OutputFormat,
}

/// Output format options for the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Wrapper for parsing comma-separated column lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldList {
    pub fields: Vec<String>,
}

impl FromStr for FieldList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<String> = s
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if fields.is_empty() {
            return Err(Error::configuration("Column list cannot be empty"));
        }

        Ok(FieldList { fields })
    }
}

/// Accept a single character or the word `tab`
fn parse_separator(value: &str) -> std::result::Result<char, String> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok('\t');
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!(
            "separator must be a single character or 'tab', got '{}'",
            value
        )),
    }
}

impl ExportArgs {
    /// Validate the arguments for consistency
    pub fn validate(&self) -> Result<()> {
        for input in &self.inputs {
            if !input.exists() {
                return Err(Error::configuration(format!(
                    "Input path does not exist: {}",
                    input.display()
                )));
            }
        }

        if let Some(output_dir) = &self.output_dir {
            if output_dir.exists() && !output_dir.is_dir() {
                return Err(Error::configuration(format!(
                    "Output path is not a directory: {}",
                    output_dir.display()
                )));
            }
        }

        if self.workers > MAX_PARALLEL_WORKERS {
            return Err(Error::configuration(format!(
                "Number of workers cannot exceed {}",
                MAX_PARALLEL_WORKERS
            )));
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Effective worker count, resolving 0 to the number of logical CPUs
    pub fn worker_count(&self) -> usize {
        match self.workers {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    /// Boundary strategy requested on the command line, if any
    pub fn boundary(&self) -> Option<BoundaryConfig> {
        self.boundary_pattern
            .as_ref()
            .map(|pattern| BoundaryConfig::Pattern {
                pattern: pattern.clone(),
            })
    }
}

impl Default for ExportArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: None,
            config_file: None,
            separator: None,
            free_text_column: None,
            primary_key: None,
            date_fields: None,
            partition_field: None,
            required: None,
            boundary_pattern: None,
            workers: DEFAULT_PARALLEL_WORKERS,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_field_list_parsing() {
        let result = FieldList::from_str("Arrival").unwrap();
        assert_eq!(result.fields, vec!["Arrival"]);

        let result = FieldList::from_str(" Arrival , Departure ").unwrap();
        assert_eq!(result.fields, vec!["Arrival", "Departure"]);

        assert!(FieldList::from_str("").is_err());
        assert!(FieldList::from_str(",,,").is_err());
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator("tab"), Ok('\t'));
        assert_eq!(parse_separator("TAB"), Ok('\t'));
        assert_eq!(parse_separator("\\t"), Ok('\t'));
        assert_eq!(parse_separator("|"), Ok('|'));
        assert!(parse_separator("").is_err());
        assert!(parse_separator("ab").is_err());
    }

    #[test]
    fn test_export_args_validation() {
        let temp_dir = TempDir::new().unwrap();
        let args = ExportArgs {
            inputs: vec![temp_dir.path().to_path_buf()],
            workers: 4,
            ..Default::default()
        };
        assert!(args.validate().is_ok());

        let mut invalid_args = args.clone();
        invalid_args.workers = MAX_PARALLEL_WORKERS + 1;
        assert!(invalid_args.validate().is_err());

        let mut invalid_args = args.clone();
        invalid_args.inputs = vec![PathBuf::from("/nonexistent/export.txt")];
        assert!(invalid_args.validate().is_err());

        let mut invalid_args = args.clone();
        invalid_args.config_file = Some(temp_dir.path().join("missing.toml"));
        assert!(invalid_args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = ExportArgs::default();
        assert_eq!(args.get_log_level(), "warn");

        args.verbose = 1;
        assert_eq!(args.get_log_level(), "info");

        args.verbose = 2;
        assert_eq!(args.get_log_level(), "debug");

        args.verbose = 3;
        assert_eq!(args.get_log_level(), "trace");

        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
    }

    #[test]
    fn test_worker_count_resolves_zero() {
        let mut args = ExportArgs::default();
        assert!(args.worker_count() >= 1);

        args.workers = 3;
        assert_eq!(args.worker_count(), 3);
    }

    #[test]
    fn test_parse_ingest_command() {
        let args = Args::try_parse_from([
            "pms-export-repair",
            "ingest",
            "export.txt",
            "--date-fields",
            "Arrival,Departure",
            "--partition-field",
            "Arrival",
            "--separator",
            "tab",
            "--csv",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Ingest(ingest)) => {
                assert!(ingest.write_csv);
                assert_eq!(ingest.export.inputs, vec![PathBuf::from("export.txt")]);
                assert_eq!(
                    ingest.export.date_fields.unwrap().fields,
                    vec!["Arrival", "Departure"]
                );
                assert_eq!(ingest.export.separator, Some('\t'));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from(["pms-export-repair", "repair", "a.txt", "-q", "-v"]);
        assert!(result.is_err());
    }
}

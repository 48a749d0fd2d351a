//! Shared components for CLI commands
//!
//! This module contains logging setup, layered configuration loading, input
//! discovery, the bounded per-file worker pool and summary reporting used by
//! every command.

use crate::app::services::export_parser::BatchSummary;
use crate::cli::args::{ExportArgs, OutputFormat};
use crate::config::PipelineConfig;
use crate::constants::{EXPORT_FILE_EXTENSIONS, LOG_TARGET};
use crate::{Error, Result};
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Outcome of processing one input file
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    /// Rows finalized by the assembler
    pub rows: usize,
    /// Validation summary (ingest only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(input: PathBuf, error: &Error) -> Self {
        Self {
            input,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Statistics for a whole CLI run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    #[serde(rename = "processing_time_seconds", serialize_with = "as_seconds")]
    pub processing_time: Duration,
}

fn as_seconds<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl RunSummary {
    pub fn files_processed(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn files_failed(&self) -> usize {
        self.files.len() - self.files_processed()
    }

    pub fn rows_processed(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn records_written(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.summary.as_ref())
            .map(|s| s.processed)
            .sum()
    }

    pub fn rows_skipped(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.summary.as_ref())
            .map(|s| s.skipped)
            .sum()
    }

    /// A run succeeds only when every file was processed
    pub fn is_success(&self) -> bool {
        self.files_failed() == 0
    }
}

/// Set up structured logging for a command
pub fn setup_logging(args: &ExportArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", LOG_TARGET, log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (defaults -> file -> args)
pub fn load_configuration(args: &ExportArgs) -> Result<PipelineConfig> {
    info!("Loading configuration");

    if let Some(path) = &args.config_file {
        info!("Using config file: {}", path.display());
    }

    let config = PipelineConfig::load_layered(args.config_file.as_deref())?;
    let config = apply_cli_overrides(config, args);

    config.validate()?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(mut config: PipelineConfig, args: &ExportArgs) -> PipelineConfig {
    if let Some(separator) = args.separator {
        config = config.with_separator(separator);
    }
    if let Some(column) = &args.free_text_column {
        config = config.with_free_text_column(column.clone());
    }
    if let Some(field) = &args.primary_key {
        config = config.with_primary_key_field(field.clone());
    }
    if let Some(list) = &args.date_fields {
        config = config.with_date_fields(list.fields.iter().cloned());
    }
    if let Some(field) = &args.partition_field {
        config = config.with_partition_date_field(field.clone());
    }
    if let Some(list) = &args.required {
        config = config.with_required_headers(list.fields.iter().cloned());
    }
    if let Some(boundary) = args.boundary() {
        config = config.with_boundary(boundary);
    }
    config
}

/// Expand the input arguments into a sorted, de-duplicated file list
///
/// Files are taken as given; directories are walked for export extensions.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input).follow_links(false) {
            let entry = entry.map_err(|e| {
                Error::configuration(format!(
                    "Failed to read directory {}: {}",
                    input.display(),
                    e
                ))
            })?;
            let path = entry.path();
            if path.is_file() && has_export_extension(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();

    debug!("Collected {} export files", files.len());
    Ok(files)
}

fn has_export_extension(path: &Path) -> bool {
    let name = path.to_string_lossy();
    // Outputs of earlier runs share the .csv extension
    if name.ends_with(crate::constants::REPAIRED_FILE_SUFFIX)
        || name.ends_with(crate::constants::VALIDATED_FILE_SUFFIX)
    {
        return false;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            EXPORT_FILE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Output location for an input: `<dir>/<file name><suffix>`
pub fn output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}", file_name, suffix))
}

/// Write an output file, creating its directory when needed
pub fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::io(
                format!("Failed to create output directory {}", parent.display()),
                e,
            )
        })?;
    }
    std::fs::write(path, contents)
        .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Run a blocking job over every file on a bounded worker pool
///
/// A failing file is recorded in its report and does not stop the others.
/// Reports come back in input order.
pub async fn process_files<F>(
    files: Vec<PathBuf>,
    workers: usize,
    show_progress: bool,
    cancellation_token: CancellationToken,
    job: F,
) -> Result<Vec<FileReport>>
where
    F: Fn(&Path) -> Result<FileReport> + Send + Sync + 'static,
{
    info!(
        "Processing {} files with {} workers",
        files.len(),
        workers.max(1)
    );

    let progress_bar = (show_progress && !files.is_empty())
        .then(|| create_progress_bar(files.len() as u64, "Processing exports"));

    let job = Arc::new(job);
    let mut tasks = stream::iter(files.into_iter().enumerate())
        .map(|(index, path)| {
            let job = Arc::clone(&job);
            tokio::task::spawn_blocking(move || {
                let report = match job(&path) {
                    Ok(report) => report,
                    Err(e) => {
                        error!("Failed to process {}: {}", path.display(), e);
                        FileReport::failed(path, &e)
                    }
                };
                (index, report)
            })
        })
        .buffer_unordered(workers.max(1));

    let mut reports = Vec::new();
    while let Some(joined) = tasks.next().await {
        if cancellation_token.is_cancelled() {
            return Err(Error::processing_interrupted("Cancelled by user"));
        }

        let (index, report) = joined.map_err(|e| {
            Error::processing_interrupted(format!("Worker task failed: {}", e))
        })?;

        if let Some(pb) = &progress_bar {
            pb.inc(1);
            pb.set_message(format!("{}", report.input.display()));
        }
        reports.push((index, report));
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    reports.sort_by_key(|(index, _)| *index);
    Ok(reports.into_iter().map(|(_, report)| report).collect())
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Print the run summary in the requested format
pub fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            print_human_summary(summary);
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary)
                .map_err(|e| Error::serialization("Failed to render run summary", e))?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn print_human_summary(summary: &RunSummary) {
    println!("\n{}", "Export Repair Summary".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for report in &summary.files {
        match &report.error {
            None => {
                println!(
                    "  {} {} ({} rows)",
                    "✓".green(),
                    report.input.display(),
                    report.rows
                );
                if let Some(batch) = &report.summary {
                    println!(
                        "      {} records, {} skipped",
                        batch.processed.to_string().bright_white().bold(),
                        batch.skipped
                    );
                    for reason in &batch.skip_reasons {
                        println!("      {} {}", "-".yellow(), reason);
                    }
                }
                for output in &report.outputs {
                    println!("      → {}", output.display());
                }
            }
            Some(message) => {
                println!("  {} {}", "✗".red(), report.input.display());
                println!("      {}", message.as_str().bright_red());
            }
        }
    }

    println!();
    println!(
        "  Files processed: {}",
        summary.files_processed().to_string().bright_white().bold()
    );
    if summary.files_failed() > 0 {
        println!(
            "  Files failed: {}",
            summary.files_failed().to_string().bright_red().bold()
        );
    }
    println!("  Rows assembled: {}", summary.rows_processed());
    if summary.records_written() > 0 || summary.rows_skipped() > 0 {
        println!("  Records written: {}", summary.records_written());
        println!("  Rows skipped: {}", summary.rows_skipped());
    }
    println!(
        "  Processing time: {}",
        HumanDuration(summary.processing_time)
    );
    println!();
}

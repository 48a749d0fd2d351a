//! Repair command implementation
//!
//! Reassembles each export and writes it back as a fully quoted CSV document,
//! with no row validation.

use super::shared::{
    FileReport, RunSummary, collect_inputs, load_configuration, output_path, print_summary,
    process_files, setup_logging, write_output,
};
use crate::app::services::csv_renderer::render_table;
use crate::app::services::export_parser::ExportParser;
use crate::cli::args::RepairArgs;
use crate::constants::REPAIRED_FILE_SUFFIX;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Repair command runner
pub async fn run_repair(
    args: RepairArgs,
    cancellation_token: CancellationToken,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    let export = &args.export;

    setup_logging(export)?;
    info!("Starting export repair");
    debug!("Command line arguments: {:?}", args);

    export.validate()?;
    let config = load_configuration(export)?;
    let parser = Arc::new(ExportParser::new(config)?);

    let files = collect_inputs(&export.inputs)?;
    let output_dir = export.output_dir.clone();

    let files = process_files(
        files,
        export.worker_count(),
        export.show_progress(),
        cancellation_token,
        move |path| repair_file(&parser, path, output_dir.as_deref()),
    )
    .await?;

    let summary = RunSummary {
        files,
        processing_time: start_time.elapsed(),
    };
    print_summary(&summary, export.output_format)?;
    Ok(summary)
}

/// Repair one export file and write `<file>.repaired.csv`
pub fn repair_file(
    parser: &ExportParser,
    input: &Path,
    output_dir: Option<&Path>,
) -> Result<FileReport> {
    let table = parser.repair_file(input)?;
    let document = render_table(&table)?;

    let output: PathBuf = output_path(input, output_dir, REPAIRED_FILE_SUFFIX);
    write_output(&output, document.as_bytes())?;

    Ok(FileReport {
        input: input.to_path_buf(),
        outputs: vec![output],
        rows: table.rows.len(),
        ..Default::default()
    })
}

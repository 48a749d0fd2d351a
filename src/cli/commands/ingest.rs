//! Ingest command implementation
//!
//! Parses and validates each export, writing one keyed JSON line per record
//! and optionally a quoted CSV of the validated records.

use super::shared::{
    FileReport, RunSummary, collect_inputs, load_configuration, output_path, print_summary,
    process_files, setup_logging, write_output,
};
use crate::app::services::csv_renderer::render_records;
use crate::app::services::export_parser::ExportParser;
use crate::app::services::record_sink::{JsonLinesSink, deliver};
use crate::cli::args::IngestArgs;
use crate::constants::{RECORDS_FILE_SUFFIX, VALIDATED_FILE_SUFFIX};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Ingest command runner
pub async fn run_ingest(
    args: IngestArgs,
    cancellation_token: CancellationToken,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    let export = &args.export;

    setup_logging(export)?;
    info!("Starting export ingest");
    debug!("Command line arguments: {:?}", args);

    export.validate()?;
    let config = load_configuration(export)?;
    let parser = Arc::new(ExportParser::new(config)?);

    let files = collect_inputs(&export.inputs)?;
    let output_dir = export.output_dir.clone();
    let write_csv = args.write_csv;

    let files = process_files(
        files,
        export.worker_count(),
        export.show_progress(),
        cancellation_token,
        move |path| ingest_file(&parser, path, output_dir.as_deref(), write_csv),
    )
    .await?;

    let summary = RunSummary {
        files,
        processing_time: start_time.elapsed(),
    };
    print_summary(&summary, export.output_format)?;
    Ok(summary)
}

/// Validate one export file and write its keyed records
///
/// A header failure returns the error and writes nothing.
pub fn ingest_file(
    parser: &ExportParser,
    input: &Path,
    output_dir: Option<&Path>,
    write_csv: bool,
) -> Result<FileReport> {
    let batch = parser.parse_file(input)?;

    if batch.skipped > 0 {
        warn!(
            "{}: skipped {} of {} rows",
            input.display(),
            batch.skipped,
            batch.total_rows()
        );
    }

    let mut sink = JsonLinesSink::new(Vec::new());
    deliver(&batch, &mut sink)?;
    let records_path = output_path(input, output_dir, RECORDS_FILE_SUFFIX);
    write_output(&records_path, &sink.into_inner()?)?;

    let mut outputs = vec![records_path];

    if write_csv {
        let csv_path = output_path(input, output_dir, VALIDATED_FILE_SUFFIX);
        match batch.records.first() {
            Some(first) => {
                let document = render_records(first.header(), &batch.records)?;
                write_output(&csv_path, document.as_bytes())?;
                outputs.push(csv_path);
            }
            None => debug!("No validated records for {}", input.display()),
        }
    }

    Ok(FileReport {
        input: input.to_path_buf(),
        outputs,
        rows: batch.total_rows(),
        summary: Some(batch.summary()),
        error: None,
    })
}

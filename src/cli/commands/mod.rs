//! Command implementations for the PMS export repair CLI
//!
//! Each command is implemented in its own module; the shared module holds the
//! logging, configuration, worker pool and reporting they have in common.

pub mod ingest;
pub mod repair;
pub mod shared;

pub use shared::{FileReport, RunSummary};

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Dispatches to the subcommand handler:
/// - `repair`: reassembled rows as fully quoted CSV
/// - `ingest`: validated records as keyed JSON lines
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<RunSummary> {
    match args.command {
        Some(Commands::Repair(repair_args)) => {
            repair::run_repair(repair_args, cancellation_token).await
        }
        Some(Commands::Ingest(ingest_args)) => {
            ingest::run_ingest(ingest_args, cancellation_token).await
        }
        None => Err(Error::configuration("No command given")),
    }
}

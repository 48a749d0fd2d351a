use clap::Parser;
use pms_export_repair::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let cancellation_token = CancellationToken::new();

        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler; wait for the command to finish
                std::future::pending::<()>().await;
            }
            cancellation_token.cancel();
        };

        tokio::select! {
            result = commands::run(args, cancellation_token.clone()) => {
                result
            }
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(pms_export_repair::Error::processing_interrupted(
                    "Processing interrupted by user"
                ))
            }
        }
    });

    match result {
        // Summary has already been printed by the command
        Ok(summary) if summary.is_success() => process::exit(0),
        Ok(summary) => {
            eprintln!(
                "Error: {} of {} files failed",
                summary.files_failed(),
                summary.files.len()
            );
            process::exit(2);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("PMS Export Repair - Line-break corrupted export reassembly");
    println!("==========================================================");
    println!();
    println!("Reassemble tab-separated property-management-system exports whose records");
    println!("were split across lines by raw line breaks in free-text fields.");
    println!();
    println!("USAGE:");
    println!("    pms-export-repair <COMMAND> [OPTIONS] <PATH>...");
    println!();
    println!("COMMANDS:");
    println!("    repair      Reassemble rows and write cleaned, fully quoted CSV");
    println!("    ingest      Validate rows and write keyed records as JSON lines");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Repair a single export next to the original:");
    println!("    pms-export-repair repair reservations.txt");
    println!();
    println!("    # Ingest a directory of exports, partitioned by arrival date:");
    println!("    pms-export-repair ingest ./exports --output ./records \\");
    println!("                             --date-fields Arrival,Departure --partition-field Arrival");
    println!();
    println!("For detailed help on any command, use:");
    println!("    pms-export-repair <COMMAND> --help");
}

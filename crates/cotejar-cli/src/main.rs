//! Cotejador: command-line interface for the Cotejar metrics pipeline
//!
//! ## Usage
//!
//! ```bash
//! cotejador analyze 1/ 2/ 3/           # Per-crop metrics for data folders
//! cotejador join 1/results 2/results   # Aggregate reports into one CSV
//! cotejador compare dehazed.npy clean_a.npy clean_b.npy
//! ```

use clap::Parser;
use cotejar_cli::{handlers, Cli, CliResult, Commands, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    init_tracing(verbosity);

    match cli.command {
        Commands::Analyze(args) => handlers::run_analyze(&args, verbosity),
        Commands::Join(args) => handlers::run_join(&args, verbosity),
        Commands::Compare(args) => handlers::run_compare(&args, verbosity),
    }
}

/// RUST_LOG wins over the verbosity flags when set
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

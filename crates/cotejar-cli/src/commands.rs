//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cotejador: CLI for Cotejar - image-quality metrics for RGB and
/// hyperspectral cubes
#[derive(Parser, Debug)]
#[command(name = "cotejador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze data folders: compute all pairwise metrics per crop
    Analyze(AnalyzeArgs),

    /// Join per-crop reports from results folders into one CSV
    Join(JoinArgs),

    /// Compare one target cube against one or more references
    Compare(CompareArgs),
}

/// Arguments for the analyze command
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Data folder roots, each holding `{basename}_crop{N}.npy` arrays and
    /// a labels.json
    #[arg(required = true)]
    pub folders: Vec<PathBuf>,

    /// Metrics to compute (default: all five)
    #[arg(short, long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Results subdirectory created inside each data folder
    #[arg(short, long, default_value = "results")]
    pub output: String,

    /// Number of worker threads for crop processing (0 = all cores)
    #[arg(short = 'j', long, default_value = "0")]
    pub jobs: usize,

    /// Process crops one at a time
    #[arg(long, conflicts_with = "jobs")]
    pub sequential: bool,

    /// Skip heatmap PNG output
    #[cfg(feature = "render")]
    #[arg(long)]
    pub no_render: bool,
}

/// Arguments for the join command
#[derive(Parser, Debug)]
pub struct JoinArgs {
    /// Results folders holding `crop_{N}_metrics.json` files
    #[arg(required = true)]
    pub folders: Vec<PathBuf>,

    /// Output CSV path
    #[arg(short, long, default_value = "complete_metrics_report.csv")]
    pub output: PathBuf,
}

/// Arguments for the compare command
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Target `.npy` cube
    pub target: PathBuf,

    /// Reference `.npy` cubes; with several, the best value per metric is
    /// also reported
    #[arg(required = true)]
    pub references: Vec<PathBuf>,

    /// Metrics to compute (default: all five)
    #[arg(short, long, value_delimiter = ',')]
    pub metrics: Vec<String>,
}

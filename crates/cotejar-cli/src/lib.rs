//! Cotejar CLI Library
//!
//! Command-line interface for the Cotejar metrics pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;

pub use commands::{AnalyzeArgs, Cli, Commands, CompareArgs, JoinArgs};
pub use config::Verbosity;
pub use error::{CliError, CliResult};

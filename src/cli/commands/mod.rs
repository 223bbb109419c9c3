//! Command implementations for the SAV converter CLI
//!
//! This module contains the command execution logic and shared helpers
//! for logging and result printing. Each command is implemented in its
//! own module:
//! - `convert`: single-file conversion
//! - `batch`: directory-of-subfolders conversion with a final summary
//! - `inspect`: diagnostics without conversion

pub mod batch;
pub mod convert;
pub mod inspect;
pub mod shared;

use anyhow::Result;

use crate::cli::args::{Args, Commands};
use crate::models::BatchStats;

/// Main command runner for the SAV converter
///
/// Dispatches to the appropriate subcommand handler based on CLI args.
pub fn run(args: Args) -> Result<BatchStats> {
    match args.get_command() {
        Commands::Convert(convert_args) => convert::run_convert(convert_args),
        Commands::Batch(batch_args) => batch::run_batch(batch_args),
        Commands::Inspect(inspect_args) => inspect::run_inspect(inspect_args),
    }
}

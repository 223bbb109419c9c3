//! Batch conversion command.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::shared;
use crate::cli::args::BatchArgs;
use crate::models::BatchStats;
use crate::processor::BatchProcessor;

/// Run the batch command over a directory of subfolders
pub fn run_batch(args: BatchArgs) -> Result<BatchStats> {
    shared::setup_logging(args.get_log_level(), args.quiet);
    args.validate()?;

    let output_root = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_root(&args.source_dir));

    let processor = BatchProcessor::new(&args.source_dir, &output_root, args.to_config())
        .with_progress(args.show_progress());
    let stats = processor.run()?;

    shared::print_batch_summary(&stats, &args.output_format)?;
    Ok(stats)
}

/// Default output location: a csv_output directory next to the source
fn default_output_root(source_dir: &Path) -> PathBuf {
    source_dir
        .parent()
        .map(|parent| parent.join("csv_output"))
        .unwrap_or_else(|| PathBuf::from("csv_output"))
}

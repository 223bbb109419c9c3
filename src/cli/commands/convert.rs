//! Single-file conversion command.

use anyhow::{Context, Result};
use std::fs;

use super::shared;
use crate::cli::args::ConvertArgs;
use crate::constants::CSV_EXTENSION;
use crate::converter::Converter;
use crate::models::BatchStats;

/// Run the convert command for one source file
pub fn run_convert(args: ConvertArgs) -> Result<BatchStats> {
    shared::setup_logging(args.get_log_level(), args.quiet);
    args.validate()?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.source.with_extension(CSV_EXTENSION));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }

    let converter = Converter::new(args.to_config());
    let report = converter.convert_file(&args.source, &output)?;
    shared::print_conversion_report(&report, &args.output_format)?;

    Ok(BatchStats {
        files_converted: 1,
        total_rows: report.rows,
        ..BatchStats::default()
    })
}

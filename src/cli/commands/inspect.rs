//! Diagnostic inspection command.

use anyhow::Result;
use tracing::warn;
use walkdir::WalkDir;

use super::shared;
use crate::cli::args::InspectArgs;
use crate::constants::SAV_EXTENSION;
use crate::error::ConvertError;
use crate::inspection::{InspectionReport, inspect_file};
use crate::models::BatchStats;

/// Run the inspect command over a file or a directory tree
pub fn run_inspect(args: InspectArgs) -> Result<BatchStats> {
    shared::setup_logging(args.get_log_level(), false);

    if !args.path.exists() {
        return Err(ConvertError::MissingSource {
            path: args.path.clone(),
        }
        .into());
    }

    let mut reports: Vec<InspectionReport> = Vec::new();
    if args.path.is_file() {
        reports.push(inspect_file(&args.path)?);
    } else {
        for entry in WalkDir::new(&args.path).sort_by_file_name() {
            let entry = entry?;
            let is_sav = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == SAV_EXTENSION);
            if !is_sav {
                continue;
            }
            match inspect_file(entry.path()) {
                Ok(report) => reports.push(report),
                Err(error) => warn!("could not inspect {}: {}", entry.path().display(), error),
            }
        }
    }

    shared::print_inspection_reports(&reports, &args.output_format)?;
    Ok(BatchStats::default())
}

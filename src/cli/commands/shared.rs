//! Shared components for CLI commands
//!
//! Logging setup and the human/JSON result printers used by every
//! subcommand.

use anyhow::Result;
use colored::*;

use crate::cli::args::OutputFormat;
use crate::inspection::InspectionReport;
use crate::models::{BatchStats, ConversionReport};

/// Set up structured logging for a command
///
/// Initialized once per process by the command entry point; logs go to
/// stderr so they never mix with machine-readable output on stdout.
pub fn setup_logging(log_level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sav_converter={}", log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if quiet {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // a second init (e.g. in tests) keeps the first subscriber
    let _ = result;
}

/// Print the report for a single conversion
pub fn print_conversion_report(report: &ConversionReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Human => {
            println!("{}", "Conversion complete".bright_green().bold());
            println!(
                "  {} {}",
                "Source:".bright_cyan(),
                report.source.display()
            );
            println!(
                "  {} {}",
                "Output:".bright_cyan(),
                report.output.display()
            );
            println!(
                "  {} {} rows x {} columns",
                "Data:".bright_cyan(),
                report.rows.to_string().bright_white().bold(),
                report.columns.to_string().bright_white().bold()
            );
            println!(
                "  {} {} / {}{}",
                "Strategy:".bright_cyan(),
                report.strategy,
                report.output_encoding,
                if report.sanitized { " (sanitized)" } else { "" }
            );
        }
    }
    Ok(())
}

/// Print the summary of a batch run
pub fn print_batch_summary(stats: &BatchStats, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
        OutputFormat::Human => {
            println!("\n{}", "Batch Summary".bright_green().bold());
            println!(
                "  {} {}ms",
                "Time elapsed:".bright_cyan(),
                stats.elapsed_ms.to_string().bright_white()
            );
            println!(
                "  {} {} ({} without SAV files)",
                "Folders scanned:".bright_cyan(),
                stats.folders_scanned.to_string().bright_white(),
                stats.folders_empty
            );
            println!(
                "  {} {}",
                "Files converted:".bright_cyan(),
                stats.files_converted.to_string().bright_white().bold()
            );
            if stats.files_failed > 0 {
                println!(
                    "  {} {}",
                    "Files failed:".bright_red(),
                    stats.files_failed.to_string().bright_red().bold()
                );
            }
            println!(
                "  {} {}",
                "Total rows:".bright_cyan(),
                stats.total_rows.to_string().bright_white()
            );
        }
    }
    Ok(())
}

/// Print the findings of an inspection walk
pub fn print_inspection_reports(reports: &[InspectionReport], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
        OutputFormat::Human => {
            for report in reports {
                let marker = if report.looks_convertible() {
                    "ok".bright_green()
                } else {
                    "??".bright_red()
                };
                println!("  [{}] {}", marker, report);
            }
            let convertible = reports.iter().filter(|r| r.looks_convertible()).count();
            println!(
                "\n{} {} of {} files look convertible",
                "Inspected:".bright_cyan(),
                convertible.to_string().bright_white().bold(),
                reports.len()
            );
        }
    }
    Ok(())
}

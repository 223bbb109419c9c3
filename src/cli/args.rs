//! Command-line argument definitions for the SAV converter
//!
//! This module defines the complete CLI interface using the clap derive
//! API: single-file conversion, batch conversion over a directory of
//! subfolders, and the diagnostic inspect command.

use crate::config::ConverterConfig;
use crate::constants::PSPP_TIMEOUT_SECS;
use crate::error::{ConvertError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the SAV converter
///
/// Converts SPSS SAV survey data files into CSV, trying a chain of
/// decoding strategies for files with ambiguous or broken legacy text
/// encodings.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sav-converter",
    version,
    about = "Convert SPSS SAV data files to CSV with encoding fallback",
    long_about = "Converts SPSS system files (.sav) into plain CSV. Files from older \
                  statistical packages often carry Big5, GBK or other legacy text \
                  encodings without declaring them correctly; the converter walks an \
                  ordered chain of decoding strategies (declared encoding, statistical \
                  detection, explicit candidates, lossy variants, a tolerant recovery \
                  parse, and optionally the PSPP command-line tool) and takes the first \
                  that succeeds."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the SAV converter
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert a single SAV file to CSV
    Convert(ConvertArgs),
    /// Convert every SAV file under a directory of subfolders
    Batch(BatchArgs),
    /// Inspect SAV files without converting anything
    Inspect(InspectArgs),
}

/// Arguments for the convert command (single file)
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Source SAV file to convert
    #[arg(value_name = "FILE")]
    pub source: PathBuf,

    /// Output CSV path
    ///
    /// If not specified, the output is the source path with a .csv
    /// extension.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Disable the external PSPP fallback strategy
    #[arg(long = "no-pspp", help = "Do not try the PSPP command-line tool")]
    pub no_pspp: bool,

    /// Program name or path of the external conversion tool
    #[arg(
        long = "pspp-program",
        value_name = "NAME",
        help = "Program to use for the external-tool strategy"
    )]
    pub pspp_program: Option<String>,

    /// Time budget for one external tool invocation, in seconds
    #[arg(
        long = "pspp-timeout",
        value_name = "SECS",
        default_value_t = PSPP_TIMEOUT_SECS,
        help = "Timeout for the external-tool strategy in seconds"
    )]
    pub pspp_timeout: u64,

    /// Skip the diagnostic pre-flight inspection
    #[arg(long = "no-inspect", help = "Skip the pre-flight file inspection")]
    pub no_inspect: bool,

    /// Overwrite an existing output file
    #[arg(short = 'f', long = "force", help = "Overwrite existing output files")]
    pub force: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the conversion report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the batch command (directory of subfolders)
#[derive(Debug, Clone, Parser)]
pub struct BatchArgs {
    /// Root directory whose subfolders hold SAV files
    ///
    /// Each immediate subfolder is treated as one dataset: a subfolder
    /// with a single SAV file produces <folder>.csv, one with several
    /// produces <folder>-1.csv, <folder>-2.csv, ...
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Output directory for the generated CSV files
    ///
    /// Created if it does not exist. If not specified, a csv_output
    /// directory is created next to SOURCE_DIR.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Disable the external PSPP fallback strategy
    #[arg(long = "no-pspp", help = "Do not try the PSPP command-line tool")]
    pub no_pspp: bool,

    /// Program name or path of the external conversion tool
    #[arg(
        long = "pspp-program",
        value_name = "NAME",
        help = "Program to use for the external-tool strategy"
    )]
    pub pspp_program: Option<String>,

    /// Time budget for one external tool invocation, in seconds
    #[arg(
        long = "pspp-timeout",
        value_name = "SECS",
        default_value_t = PSPP_TIMEOUT_SECS,
        help = "Timeout for the external-tool strategy in seconds"
    )]
    pub pspp_timeout: u64,

    /// Skip the diagnostic pre-flight inspection
    #[arg(long = "no-inspect", help = "Skip the pre-flight file inspection")]
    pub no_inspect: bool,

    /// Overwrite existing output files
    #[arg(short = 'f', long = "force", help = "Overwrite existing output files")]
    pub force: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the batch summary
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the inspect command (diagnostics only)
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// SAV file or directory tree to inspect
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Output format for the inspection report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Output format options for machine-readable results
#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .expect("Command should be present when get_command() is called")
    }
}

impl ConvertArgs {
    /// Validate the convert command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        validate_tool_flags(self.pspp_timeout, self.pspp_program.as_deref())
    }

    /// Build the converter configuration from the flags
    pub fn to_config(&self) -> ConverterConfig {
        build_config(
            self.no_pspp,
            self.pspp_program.as_deref(),
            self.pspp_timeout,
            self.no_inspect,
            self.force,
        )
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }
}

impl BatchArgs {
    /// Validate the batch command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(output_dir) = &self.output_dir {
            if output_dir.is_file() {
                return Err(ConvertError::configuration(format!(
                    "Output path is a file, not a directory: {}",
                    output_dir.display()
                )));
            }
        }
        validate_tool_flags(self.pspp_timeout, self.pspp_program.as_deref())
    }

    /// Build the converter configuration from the flags
    pub fn to_config(&self) -> ConverterConfig {
        build_config(
            self.no_pspp,
            self.pspp_program.as_deref(),
            self.pspp_timeout,
            self.no_inspect,
            self.force,
        )
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }

    /// Check if we should show a progress bar (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl InspectArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, false)
    }
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn validate_tool_flags(timeout: u64, program: Option<&str>) -> Result<()> {
    if timeout == 0 {
        return Err(ConvertError::configuration(
            "PSPP timeout must be greater than 0 seconds".to_string(),
        ));
    }
    if let Some(program) = program {
        if program.trim().is_empty() {
            return Err(ConvertError::configuration(
                "PSPP program name cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn build_config(
    no_pspp: bool,
    program: Option<&str>,
    timeout: u64,
    no_inspect: bool,
    force: bool,
) -> ConverterConfig {
    let mut config = ConverterConfig::default().with_pspp_timeout_secs(timeout);
    if no_pspp {
        config = config.without_pspp();
    }
    if let Some(program) = program {
        config = config.with_pspp_program(program);
    }
    if no_inspect {
        config = config.without_inspection();
    }
    if force {
        config = config.with_overwrite();
    }
    config
}

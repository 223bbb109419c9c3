//! Error handling for SAV conversion operations.
//!
//! Per-strategy failures are caught inside the fallback chain and never
//! propagate; the variants here describe what the caller can actually
//! observe, plus the internal reasons that feed the per-strategy summaries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Source file not found: {}", .path.display())]
    MissingSource { path: PathBuf },

    #[error("All read strategies failed for {}:{}", .path.display(), format_attempts(.attempts))]
    DecodeExhausted {
        path: PathBuf,
        attempts: Vec<StrategyFailure>,
    },

    #[error("All output encodings failed for {}:{}", .path.display(), format_attempts(.attempts))]
    EncodeExhausted {
        path: PathBuf,
        attempts: Vec<StrategyFailure>,
    },

    #[error("Not a valid SAV file: {} - {reason}", .path.display())]
    InvalidContainer { path: PathBuf, reason: String },

    #[error("Unsupported SAV feature in {}: {feature}", .path.display())]
    UnsupportedFeature { path: PathBuf, feature: String },

    #[error("Text could not be decoded as {encoding}")]
    DecodeFailed { encoding: String },

    #[error("Value in column '{column}' cannot be represented in {encoding}")]
    EncodeFailed { column: String, encoding: String },

    #[error("Conversion tool '{program}' is not available: {reason}")]
    ToolUnavailable { program: String, reason: String },

    #[error("Conversion tool '{program}' exceeded the {seconds}s time budget")]
    ToolTimeout { program: String, seconds: u64 },

    #[error("Conversion tool '{program}' failed: {reason}")]
    ToolFailed { program: String, reason: String },

    #[error("Output already exists: {} (use --force to overwrite)", .path.display())]
    OutputExists { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// One failed attempt in a strategy chain, kept for the exhaustion report.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    /// Label of the strategy or output encoding that failed.
    pub strategy: String,
    /// Short human-readable reason.
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }
}

fn format_attempts(attempts: &[StrategyFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("\n  {}: {}", a.strategy, a.reason))
        .collect()
}

impl ConvertError {
    /// Create a container error for a malformed system file.
    pub fn invalid_container(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidContainer {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported_feature(path: impl Into<PathBuf>, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            path: path.into(),
            feature: feature.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True if this error should be treated as "try the next strategy"
    /// rather than aborting the chain. Everything a single strategy can
    /// raise qualifies; exhaustion errors do not.
    pub fn is_strategy_level(&self) -> bool {
        !matches!(
            self,
            ConvertError::MissingSource { .. }
                | ConvertError::DecodeExhausted { .. }
                | ConvertError::EncodeExhausted { .. }
                | ConvertError::OutputExists { .. }
                | ConvertError::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

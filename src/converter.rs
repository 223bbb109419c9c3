//! Per-file conversion orchestration.
//!
//! Ties the pieces together for one source file: the missing-source
//! check, the diagnostic inspection, the read-strategy chain and the
//! write-encoding chain. Every strategy failure is logged and swallowed;
//! only exhaustion of a whole phase reaches the caller.

use chrono::Utc;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result, StrategyFailure};
use crate::inspection::inspect_file;
use crate::models::ConversionReport;
use crate::strategies::{self, ReadOutcome};
use crate::writer;

/// Converts single files under one configuration
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert one source file to CSV at `output`.
    pub fn convert_file(&self, source: &Path, output: &Path) -> Result<ConversionReport> {
        if !source.exists() {
            return Err(ConvertError::MissingSource {
                path: source.to_path_buf(),
            });
        }
        if output.exists() && !self.config.overwrite {
            return Err(ConvertError::OutputExists {
                path: output.to_path_buf(),
            });
        }

        if self.config.inspect_before_convert {
            match inspect_file(source) {
                Ok(report) => info!("{}", report),
                Err(error) => warn!("inspection of {} failed: {}", source.display(), error),
            }
        }

        let outcome = self.read_table(source)?;
        info!(
            "read {} with strategy '{}' ({}): {} rows x {} columns",
            source.display(),
            outcome.strategy,
            outcome.encoding,
            outcome.table.row_count(),
            outcome.table.column_count()
        );

        let written = writer::write_table(&outcome.table, output)?;
        info!(
            "converted {} -> {} (strategy '{}', encoding {}{})",
            source.display(),
            output.display(),
            outcome.strategy,
            written.encoding,
            if written.sanitized { ", sanitized" } else { "" }
        );

        Ok(ConversionReport {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            strategy: outcome.strategy,
            output_encoding: written.encoding,
            sanitized: written.sanitized,
            rows: outcome.table.row_count(),
            columns: outcome.table.column_count(),
            finished_at: Utc::now(),
        })
    }

    /// Run the read-strategy chain until one succeeds.
    fn read_table(&self, source: &Path) -> Result<ReadOutcome> {
        let bytes = fs::read(source)?;
        let mut attempts = Vec::new();

        for strategy in strategies::build_chain(&self.config) {
            match strategies::attempt(&strategy, source, &bytes, &self.config) {
                Ok(outcome) => {
                    info!(
                        "strategy '{}' succeeded for {}",
                        strategy.label,
                        source.display()
                    );
                    return Ok(outcome);
                }
                Err(error) => {
                    warn!(
                        "strategy '{}' failed for {}: {}",
                        strategy.label,
                        source.display(),
                        error
                    );
                    attempts.push(StrategyFailure::new(strategy.label.clone(), error.to_string()));
                }
            }
        }

        Err(ConvertError::DecodeExhausted {
            path: source.to_path_buf(),
            attempts,
        })
    }
}

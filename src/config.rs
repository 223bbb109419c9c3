//! Configuration for conversion runs.
//!
//! One flat structure covers the knobs a run can turn: the external-tool
//! strategy, pre-flight inspection, and overwrite policy. The command
//! layer builds it from CLI flags; library callers use the builder
//! methods.

use serde::{Deserialize, Serialize};

use crate::constants::{PSPP_PROGRAM, PSPP_TIMEOUT_SECS};

/// Settings shared by single-file and batch conversions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Try the external command-line tool after all native strategies fail
    pub enable_pspp: bool,

    /// Program name or path of the external tool
    pub pspp_program: String,

    /// Time budget for one external tool invocation, in seconds
    pub pspp_timeout_secs: u64,

    /// Log a pre-flight inspection of each source file before converting
    pub inspect_before_convert: bool,

    /// Overwrite existing output files instead of refusing
    pub overwrite: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            enable_pspp: true,
            pspp_program: PSPP_PROGRAM.to_string(),
            pspp_timeout_secs: PSPP_TIMEOUT_SECS,
            inspect_before_convert: true,
            overwrite: false,
        }
    }
}

impl ConverterConfig {
    /// Disable the external-tool strategy entirely
    pub fn without_pspp(mut self) -> Self {
        self.enable_pspp = false;
        self
    }

    /// Use a different program for the external-tool strategy
    pub fn with_pspp_program(mut self, program: impl Into<String>) -> Self {
        self.pspp_program = program.into();
        self
    }

    /// Change the external-tool time budget
    pub fn with_pspp_timeout_secs(mut self, secs: u64) -> Self {
        self.pspp_timeout_secs = secs;
        self
    }

    /// Skip the diagnostic pre-flight inspection
    pub fn without_inspection(mut self) -> Self {
        self.inspect_before_convert = false;
        self
    }

    /// Allow overwriting existing outputs
    pub fn with_overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::default();
        assert!(config.enable_pspp);
        assert_eq!(config.pspp_program, "pspp");
        assert_eq!(config.pspp_timeout_secs, 30);
        assert!(!config.overwrite);
    }

    #[test]
    fn test_builders() {
        let config = ConverterConfig::default()
            .without_pspp()
            .with_pspp_timeout_secs(5)
            .with_overwrite();
        assert!(!config.enable_pspp);
        assert_eq!(config.pspp_timeout_secs, 5);
        assert!(config.overwrite);
    }
}

//! The ordered read-strategy chain.
//!
//! Conversion tries each strategy in a fixed order and takes the first
//! success, unconditionally. The order mirrors how the encoding mess is
//! usually resolved in practice: trust the file, then statistics, then
//! the explicit candidates strict and lossy, then a tolerant re-parse,
//! then the external tool.

use encoding_rs::{BIG5, Encoding, GBK, UTF_8, WINDOWS_1252};
use std::path::Path;

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::models::Table;
use crate::pspp::PsppRunner;
use crate::sav::decode::{DecodeOptions, EncodingChoice, decode_file};
use crate::sav::raw::{ParseMode, read_file};

/// Explicit encoding candidates with the labels used in logs and reports.
/// Must stay in sync with [`crate::constants::READ_ENCODING_CANDIDATES`].
fn fixed_candidates() -> [(&'static str, &'static Encoding); 4] {
    [
        ("utf-8", UTF_8),
        ("big5", BIG5),
        ("gbk", GBK),
        ("windows-1252", WINDOWS_1252),
    ]
}

/// One entry of the fallback chain
#[derive(Debug, Clone)]
pub struct ReadStrategy {
    pub label: String,
    pub kind: StrategyKind,
}

#[derive(Debug, Clone)]
pub enum StrategyKind {
    /// Parse the container in-process and decode under the given options
    Native {
        options: DecodeOptions,
        mode: ParseMode,
    },
    /// Hand the file to the external conversion tool
    External,
}

impl ReadStrategy {
    fn native(label: &str, options: DecodeOptions, mode: ParseMode) -> Self {
        Self {
            label: label.to_string(),
            kind: StrategyKind::Native { options, mode },
        }
    }
}

/// Result of a successful read: the table plus what produced it
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub table: Table,
    /// Label of the strategy that succeeded
    pub strategy: String,
    /// Name of the character encoding that was applied
    pub encoding: String,
}

/// Build the fallback chain for a configuration. The order is fixed and
/// deterministic; configuration can only drop the external-tool tail.
pub fn build_chain(config: &ConverterConfig) -> Vec<ReadStrategy> {
    let mut chain = vec![
        ReadStrategy::native(
            "default",
            DecodeOptions::strict(EncodingChoice::Declared),
            ParseMode::Strict,
        ),
        ReadStrategy::native(
            "auto-detect",
            DecodeOptions::strict(EncodingChoice::Detected),
            ParseMode::Strict,
        ),
    ];

    for (label, encoding) in fixed_candidates() {
        chain.push(ReadStrategy::native(
            label,
            DecodeOptions::strict(EncodingChoice::Fixed(encoding)),
            ParseMode::Strict,
        ));
    }
    for (label, encoding) in fixed_candidates() {
        chain.push(ReadStrategy::native(
            &format!("{} (lossy)", label),
            DecodeOptions::lossy(EncodingChoice::Fixed(encoding)),
            ParseMode::Strict,
        ));
    }

    chain.push(ReadStrategy::native(
        "recovery",
        DecodeOptions::lossy(EncodingChoice::Declared),
        ParseMode::Lenient,
    ));

    if config.enable_pspp {
        chain.push(ReadStrategy {
            label: "pspp".to_string(),
            kind: StrategyKind::External,
        });
    }

    chain
}

/// Run a single strategy against the file. Errors returned here are
/// per-strategy failures; the caller logs them and moves on.
pub fn attempt(
    strategy: &ReadStrategy,
    path: &Path,
    bytes: &[u8],
    config: &ConverterConfig,
) -> Result<ReadOutcome> {
    match &strategy.kind {
        StrategyKind::Native { options, mode } => {
            let raw = read_file(path, bytes, *mode)?;
            let (table, encoding) = decode_file(&raw, options)?;
            Ok(ReadOutcome {
                table,
                strategy: strategy.label.clone(),
                encoding: encoding.name().to_string(),
            })
        }
        StrategyKind::External => {
            let table = PsppRunner::from_config(config).convert(path)?;
            Ok(ReadOutcome {
                table,
                strategy: strategy.label.clone(),
                encoding: "UTF-8".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::READ_ENCODING_CANDIDATES;

    #[test]
    fn chain_order_is_deterministic() {
        let chain = build_chain(&ConverterConfig::default());
        let labels: Vec<&str> = chain.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "default",
                "auto-detect",
                "utf-8",
                "big5",
                "gbk",
                "windows-1252",
                "utf-8 (lossy)",
                "big5 (lossy)",
                "gbk (lossy)",
                "windows-1252 (lossy)",
                "recovery",
                "pspp",
            ]
        );
    }

    #[test]
    fn disabling_pspp_drops_only_the_tail() {
        let chain = build_chain(&ConverterConfig::default().without_pspp());
        assert_eq!(chain.len(), 11);
        assert!(chain.iter().all(|s| s.label != "pspp"));
    }

    #[test]
    fn fixed_candidates_match_constants() {
        let labels: Vec<&str> = fixed_candidates().iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, READ_ENCODING_CANDIDATES);
    }
}

//! Batch conversion engine.
//!
//! Walks every subfolder of a batch root, converts each source file it
//! finds, and keeps going no matter what any single file does. Success
//! and failure counters feed the final summary; individual outcomes are
//! only logged.

pub mod discovery;

use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use self::discovery::FolderDiscovery;

use crate::config::ConverterConfig;
use crate::converter::Converter;
use crate::error::Result;
use crate::models::BatchStats;

/// Converts every source file under a batch root
#[derive(Debug)]
pub struct BatchProcessor {
    source_root: PathBuf,
    output_root: PathBuf,
    converter: Converter,
    show_progress: bool,
}

impl BatchProcessor {
    /// Create a batch processor writing all outputs into `output_root`
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        config: ConverterConfig,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            converter: Converter::new(config),
            show_progress: false,
        }
    }

    /// Show a progress bar while running
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Convert everything. Returns the aggregate counters; per-file
    /// failures never abort the run.
    pub fn run(&self) -> Result<BatchStats> {
        let started = Instant::now();

        let folders = FolderDiscovery::new(&self.source_root).discover()?;
        fs::create_dir_all(&self.output_root)?;
        info!(
            "processing {} folders from {} into {}",
            folders.len(),
            self.source_root.display(),
            self.output_root.display()
        );

        let bar = self.create_progress_bar(folders.len() as u64);
        let mut stats = BatchStats::default();

        for folder in &folders {
            bar.set_message(folder.name.clone());
            stats.folders_scanned += 1;

            if folder.is_empty() {
                info!("no SAV files in folder {}", folder.name);
                stats.folders_empty += 1;
                bar.inc(1);
                continue;
            }

            for (source, output_name) in folder.sav_files.iter().zip(folder.output_names()) {
                let output = self.output_root.join(output_name);
                let result = self.converter.convert_file(source, &output);
                if let Err(error) = &result {
                    warn!("conversion failed for {}: {}", source.display(), error);
                }
                stats.record(&result);
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "batch complete: {} converted, {} failed, {} empty folders",
            stats.files_converted, stats.files_failed, stats.folders_empty
        );
        Ok(stats)
    }

    fn create_progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} folders {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    }
}

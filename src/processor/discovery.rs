//! Source folder discovery for batch conversion.
//!
//! Batch input follows the survey-archive layout: a root directory whose
//! immediate subfolders each hold the SAV files of one dataset release.
//! Output naming hangs off the subfolder: a single file takes the folder
//! name, several files take `-1`, `-2`, … suffixes in sorted file order.

use glob::glob;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{SAV_FILE_PATTERN, numbered_output_filename, single_output_filename};
use crate::error::{ConvertError, Result};

/// One subfolder of the batch root and the source files inside it
#[derive(Debug, Clone)]
pub struct SourceFolder {
    pub path: PathBuf,
    pub name: String,
    /// Source files in sorted order
    pub sav_files: Vec<PathBuf>,
}

impl SourceFolder {
    pub fn is_empty(&self) -> bool {
        self.sav_files.is_empty()
    }

    /// Output filenames, parallel to `sav_files`
    pub fn output_names(&self) -> Vec<String> {
        if self.sav_files.len() == 1 {
            vec![single_output_filename(&self.name)]
        } else {
            (1..=self.sav_files.len())
                .map(|index| numbered_output_filename(&self.name, index))
                .collect()
        }
    }
}

/// Scans the batch root for source folders
#[derive(Debug)]
pub struct FolderDiscovery {
    root: PathBuf,
}

impl FolderDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List the subfolders of the root in sorted order, each with its
    /// source files. Folders without SAV files are included so the batch
    /// summary can count them.
    pub fn discover(&self) -> Result<Vec<SourceFolder>> {
        if !self.root.is_dir() {
            return Err(ConvertError::MissingSource {
                path: self.root.clone(),
            });
        }

        let mut folders = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(scan_folder(&entry.path())?);
            }
        }
        folders.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            "discovered {} folders under {}",
            folders.len(),
            self.root.display()
        );
        Ok(folders)
    }
}

fn scan_folder(path: &Path) -> Result<SourceFolder> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string());

    let pattern = path.join(SAV_FILE_PATTERN).to_string_lossy().to_string();
    let mut sav_files: Vec<PathBuf> = glob(&pattern)
        .map_err(|error| ConvertError::configuration(format!("bad glob pattern: {}", error)))?
        .flatten()
        .collect();
    sav_files.sort();

    debug!("folder {}: {} sav files", name, sav_files.len());
    Ok(SourceFolder {
        path: path.to_path_buf(),
        name,
        sav_files,
    })
}

//! Pre-flight inspection of source files.
//!
//! A cheap, purely diagnostic look at a file before conversion: does the
//! magic signature match, how big is it, and what does a statistical
//! encoding guess over the first few kilobytes say. The result is logged
//! and shown by the `inspect` command; it never influences which read
//! strategies run or what they return.

use chardetng::EncodingDetector;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::constants::{INSPECTION_SAMPLE_BYTES, SAV_MAGIC, ZSAV_MAGIC};
use crate::error::{ConvertError, Result};

/// Findings of one file inspection
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    pub path: PathBuf,
    pub file_size: u64,
    /// Leading bytes carried the plain system-file signature
    pub is_sav: bool,
    /// Leading bytes carried the zlib-compressed signature
    pub is_zsav: bool,
    /// Statistical encoding guess over the sampled bytes
    pub encoding_guess: String,
    /// Whether the detector was confident about the guess
    pub guess_confident: bool,
}

impl InspectionReport {
    /// The file looks like something the converter can work on
    pub fn looks_convertible(&self) -> bool {
        self.is_sav || self.is_zsav
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = if self.is_sav {
            "SAV"
        } else if self.is_zsav {
            "ZSAV"
        } else {
            "not a system file"
        };
        write!(
            f,
            "{}: {} bytes, {}, encoding guess {}{}",
            self.path.display(),
            self.file_size,
            format,
            self.encoding_guess,
            if self.guess_confident {
                ""
            } else {
                " (low confidence)"
            }
        )
    }
}

/// Inspect a file by sampling its first bytes.
pub fn inspect_file(path: &Path) -> Result<InspectionReport> {
    if !path.exists() {
        return Err(ConvertError::MissingSource {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut sample = vec![0u8; INSPECTION_SAMPLE_BYTES];
    let read = read_up_to(&mut file, &mut sample)?;
    sample.truncate(read);

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, true);
    let (encoding, confident) = detector.guess_assess(None, true);

    Ok(InspectionReport {
        path: path.to_path_buf(),
        file_size,
        is_sav: sample.starts_with(SAV_MAGIC),
        is_zsav: sample.starts_with(ZSAV_MAGIC),
        encoding_guess: encoding.name().to_string(),
        guess_confident: confident,
    })
}

/// Fill as much of `buffer` as the file provides
fn read_up_to(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buffer.len() {
        let read = file.read(&mut buffer[total..])?;
        if read == 0 {
            break;
        }
        total += read;
    }
    Ok(total)
}

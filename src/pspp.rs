//! External-tool read strategy.
//!
//! When every native strategy fails, PSPP (if installed) gets one chance:
//! a generated `.sps` script tells it to translate the source into a CSV
//! in a scoped temp directory, which is then loaded as the table. The
//! temp directory owns both the script and the intermediate file, so
//! every exit path — success, tool failure, timeout, kill — cleans up.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ConverterConfig;
use crate::constants::{PSPP_POLL_INTERVAL_MS, PSPP_PROGRAM, PSPP_TIMEOUT_SECS};
use crate::error::{ConvertError, Result};
use crate::models::Table;
use crate::writer::load_csv_table;

/// Runs the external conversion tool with a bounded time budget
#[derive(Debug, Clone)]
pub struct PsppRunner {
    program: String,
    timeout: Duration,
}

impl Default for PsppRunner {
    fn default() -> Self {
        Self {
            program: PSPP_PROGRAM.to_string(),
            timeout: Duration::from_secs(PSPP_TIMEOUT_SECS),
        }
    }
}

impl PsppRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.pspp_program.clone(),
            Duration::from_secs(config.pspp_timeout_secs),
        )
    }

    /// Convert `source` by scripting the external tool, returning the
    /// table loaded from its intermediate CSV.
    pub fn convert(&self, source: &Path) -> Result<Table> {
        let workdir = tempfile::Builder::new()
            .prefix("sav_converter-")
            .tempdir()?;
        let intermediate = workdir.path().join("converted.csv");
        let script_path = workdir.path().join("convert.sps");
        std::fs::write(&script_path, generate_script(source, &intermediate))?;

        debug!(
            "invoking {} with script {}",
            self.program,
            script_path.display()
        );

        let mut child = Command::new(&self.program)
            .arg(&script_path)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| ConvertError::ToolUnavailable {
                program: self.program.clone(),
                reason: if error.kind() == ErrorKind::NotFound {
                    "not installed".to_string()
                } else {
                    error.to_string()
                },
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        // best effort; the process may have exited already
                        child.kill().ok();
                        child.wait().ok();
                        return Err(ConvertError::ToolTimeout {
                            program: self.program.clone(),
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(PSPP_POLL_INTERVAL_MS));
                }
                Err(error) => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(ConvertError::Io(error));
                }
            }
        };

        if !status.success() {
            return Err(ConvertError::ToolFailed {
                program: self.program.clone(),
                reason: format!("exit status {}", status),
            });
        }
        if !intermediate.exists() {
            warn!("{} exited cleanly but wrote no output", self.program);
            return Err(ConvertError::ToolFailed {
                program: self.program.clone(),
                reason: "produced no output file".to_string(),
            });
        }

        load_csv_table(&intermediate)
        // workdir drops here, removing the script and intermediate file
    }
}

/// The conversion script handed to the tool: translate to CSV, UTF-8,
/// with the variable names as the header row.
fn generate_script(source: &Path, outfile: &Path) -> String {
    format!(
        "GET FILE='{}'.\n\
         SAVE TRANSLATE OUTFILE='{}'\n\
         \x20 /TYPE=CSV\n\
         \x20 /ENCODING='UTF-8'\n\
         \x20 /MAP\n\
         \x20 /REPLACE\n\
         \x20 /FIELDNAMES\n\
         \x20 /CELLS=VALUES.\n",
        source.display(),
        outfile.display()
    )
}

//! External converter seam and the `ebook-convert` subprocess implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default program name of the calibre command line converter
pub const DEFAULT_CONVERTER: &str = "ebook-convert";

/// Maximum number of stderr bytes kept when the converter fails
const STDERR_TAIL_LIMIT: usize = 2048;

/// Errors raised while probing or running the external converter
#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    /// Converter binary not found.
    #[error("{program} not found")]
    NotFound { program: PathBuf },

    /// The version probe ran but did not identify the expected tool.
    #[error("{program} did not respond to a version check: {reason}")]
    ProbeFailed { program: PathBuf, reason: String },

    /// Converter process exited unsuccessfully.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Converter process exceeded the per-job deadline.
    #[error("Conversion timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// I/O error while spawning or waiting on the converter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn probe_failed(program: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            program: program.into(),
            reason: reason.into(),
        }
    }

    fn from_spawn(program: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                program: program.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

/// A converter that turns one input document into one output document.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts `input` into `output`, waiting until the output is complete.
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConverterError>;

    /// Checks that the converter is installed and usable, returning its version banner.
    async fn validate(&self) -> Result<String, ConverterError>;
}

/// Converter backed by calibre's `ebook-convert` executable.
#[derive(Debug, Clone)]
pub struct EbookConvert {
    program: PathBuf,
    /// File stem of `program`, expected in the version banner
    name: String,
    timeout: Option<Duration>,
}

impl EbookConvert {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_CONVERTER.to_string());
        Self {
            program,
            name,
            timeout: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }

    /// Kill the converter and fail the job when it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

}

impl Default for EbookConvert {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl Converter for EbookConvert {
    fn name(&self) -> &str {
        &self.name
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConverterError> {
        debug!(program = %self.program.display(), input = %input.display(), output = %output.display(), "spawning converter");

        let child = Command::new(&self.program)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConverterError::from_spawn(&self.program, e))?;

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ConverterError::Timeout { timeout: limit })?,
            None => child.wait_with_output().await,
        };
        let output = result?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = stderr_tail(&output.stderr);
        let reason = match output.status.code() {
            Some(code) => format!("{} exited with code {}", self.name, code),
            None => format!("{} was terminated by a signal", self.name),
        };
        Err(ConverterError::conversion_failed(reason, stderr))
    }

    async fn validate(&self) -> Result<String, ConverterError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| ConverterError::from_spawn(&self.program, e))?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(
                &self.program,
                format!("exit status {}", output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.contains(self.name.as_str()) {
            return Err(ConverterError::probe_failed(
                &self.program,
                "unexpected version output",
            ));
        }

        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

/// Keep the last few kilobytes of stderr, which is where calibre reports the failure
fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut start = text.len().saturating_sub(STDERR_TAIL_LIMIT);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    Some(text[start..].to_string())
}

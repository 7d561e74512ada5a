//! Error types and handling infrastructure for batch PDF to EPUB conversion

use std::fmt;
use std::path::PathBuf;

use crate::conversion::converter::ConverterError;

/// Steps of a single conversion job, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Renaming the source file to its safe name
    RenameIn,
    /// Running the external converter
    Conversion,
    /// Restoring the source file's original name
    RenameBack,
    /// Renaming the produced file to the original basename
    RenameOutput,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RenameIn => "rename-in",
            Stage::Conversion => "conversion",
            Stage::RenameBack => "rename-back",
            Stage::RenameOutput => "rename-output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause of a failed job step
#[derive(Debug, thiserror::Error)]
pub enum JobFailure {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Converter(#[from] ConverterError),
}

/// A single job that failed at a given stage
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed for '{file_name}': {cause}")]
pub struct JobError {
    pub file_name: String,
    pub stage: Stage,
    #[source]
    pub cause: JobFailure,
}

impl JobError {
    pub fn new(file_name: impl Into<String>, stage: Stage, cause: impl Into<JobFailure>) -> Self {
        Self {
            file_name: file_name.into(),
            stage,
            cause: cause.into(),
        }
    }

    /// Whether the external converter, rather than the filesystem, caused the failure
    pub fn is_converter_failure(&self) -> bool {
        matches!(self.cause, JobFailure::Converter(_))
    }
}

/// Main error type for batch conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Converter unavailable: {0}")]
    ConverterUnavailable(#[source] ConverterError),

    #[error("Cannot read target directory {path}: {source}")]
    TargetUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot determine the current working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ConversionError {
    pub fn target_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TargetUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn output_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDirectory {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::ConverterUnavailable(err) => format!(
                "{}\nPlease install the ebook-convert tool on your machine: \
                 https://calibre-ebook.com/download",
                err
            ),
            Self::TargetUnreadable { path, source } => {
                format!("Target path ({}) cannot be read: {}", path.display(), source)
            }
            Self::Job(err) => format!(
                "Converting '{}' failed during {}: {}",
                err.file_name, err.stage, err.cause
            ),
            _ => self.to_string(),
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for a single job
pub type JobResult<T> = Result<T, JobError>;

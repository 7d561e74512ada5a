//! Configuration options for batch PDF to EPUB conversion

use std::path::PathBuf;
use std::time::Duration;

use crate::conversion::converter::DEFAULT_CONVERTER;
use crate::source::{SOURCE_EXTENSION, TARGET_EXTENSION};

/// What the scheduler does when a job fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Reject the batch with the first error and start no further jobs
    #[default]
    FailFast,
    /// Run every job and report all failures at the end
    ContinueOnError,
}

impl FailurePolicy {
    pub fn from_continue_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            FailurePolicy::ContinueOnError
        } else {
            FailurePolicy::FailFast
        }
    }
}

/// Default concurrency: logical cores minus one, at least one
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Batch conversion configuration options
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Converter executable (name on PATH or explicit path)
    pub converter_path: PathBuf,
    /// Maximum number of jobs converting at once
    pub concurrency: usize,
    /// Behaviour when a job fails
    pub failure_policy: FailurePolicy,
    /// Extension of the input documents
    pub source_extension: String,
    /// Extension of the produced documents
    pub target_extension: String,
    /// Per-job converter deadline
    pub timeout: Option<Duration>,
    /// Draw the progress bar on an interactive stdout
    pub show_progress: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            converter_path: PathBuf::from(DEFAULT_CONVERTER),
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::FailFast,
            source_extension: SOURCE_EXTENSION.to_string(),
            target_extension: TARGET_EXTENSION.to_string(),
            timeout: None,
            show_progress: true,
        }
    }
}

impl ConversionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the converter executable
    pub fn with_converter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.converter_path = path.into();
        self
    }

    /// Set the concurrency limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the per-job timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable/disable the progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.converter_path.as_os_str().is_empty() {
            return Err("Converter path must not be empty".to_string());
        }

        if self.source_extension.is_empty() || self.target_extension.is_empty() {
            return Err("Source and target extensions must not be empty".to_string());
        }

        if self.source_extension == self.target_extension {
            return Err("Source and target extensions must differ".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err("Timeout must be greater than 0".to_string());
            }
        }

        Ok(())
    }
}

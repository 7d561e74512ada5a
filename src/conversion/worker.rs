//! Conversion of a single document: rename to a safe name, convert, restore names.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::conversion::converter::Converter;
use crate::error::{JobError, JobResult, Stage};
use crate::naming::replace_extension;

/// One source document to convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Original file name inside `source_dir`
    pub source_name: String,
    /// Sanitized name the converter sees
    pub safe_name: String,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of the produced document, without the dot
    pub target_extension: String,
}

impl ConversionJob {
    pub fn new(
        source_name: impl Into<String>,
        safe_name: impl Into<String>,
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        target_extension: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            safe_name: safe_name.into(),
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            target_extension: target_extension.into(),
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.source_name)
    }

    pub fn safe_source_path(&self) -> PathBuf {
        self.source_dir.join(&self.safe_name)
    }

    /// Where the converter writes its output
    pub fn safe_output_path(&self) -> PathBuf {
        self.output_dir
            .join(replace_extension(&self.safe_name, &self.target_extension))
    }

    /// Final location of the converted document
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(replace_extension(&self.source_name, &self.target_extension))
    }
}

/// A successfully converted document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub source_name: String,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

/// Rename `from` to `to`, skipping the call when both are the same path
async fn rename_if_needed(from: &Path, to: &Path) -> std::io::Result<()> {
    if from == to {
        return Ok(());
    }
    tokio::fs::rename(from, to).await
}

/// Run the four steps of one job in order.
///
/// Any failure stops this job. When the converter fails after the source was
/// renamed, the original name is restored before the error is returned.
pub async fn run_job<C>(converter: &C, job: &ConversionJob) -> JobResult<JobOutcome>
where
    C: Converter + ?Sized,
{
    let start = Instant::now();
    let source = job.source_path();
    let safe_source = job.safe_source_path();
    let safe_output = job.safe_output_path();
    let output = job.output_path();

    debug!(file = %job.source_name, safe = %job.safe_name, "renaming source to safe name");
    rename_if_needed(&source, &safe_source)
        .await
        .map_err(|e| JobError::new(&job.source_name, Stage::RenameIn, e))?;

    debug!(file = %job.source_name, converter = converter.name(), "converting");
    if let Err(err) = converter.convert(&safe_source, &safe_output).await {
        if let Err(restore) = rename_if_needed(&safe_source, &source).await {
            warn!(
                file = %job.source_name,
                safe = %job.safe_name,
                error = %restore,
                "could not restore original name after failed conversion"
            );
        }
        return Err(JobError::new(&job.source_name, Stage::Conversion, err));
    }

    rename_if_needed(&safe_source, &source)
        .await
        .map_err(|e| JobError::new(&job.source_name, Stage::RenameBack, e))?;

    rename_if_needed(&safe_output, &output)
        .await
        .map_err(|e| JobError::new(&job.source_name, Stage::RenameOutput, e))?;

    let elapsed = start.elapsed();
    debug!(file = %job.source_name, output = %output.display(), ?elapsed, "converted");

    Ok(JobOutcome {
        source_name: job.source_name.clone(),
        output_path: output,
        elapsed,
    })
}

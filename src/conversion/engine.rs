//! Batch conversion entry point: enumerate, name, schedule

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cli::path_mapping::DirectoryPair;
use crate::conversion::batch::BatchScheduler;
use crate::conversion::config::ConversionConfig;
use crate::conversion::converter::{Converter, EbookConvert};
use crate::conversion::stats::BatchReport;
use crate::conversion::worker::ConversionJob;
use crate::error::{ConversionError, ConversionResult};
use crate::naming::{replace_extension, SafeNameAllocator};
use crate::progress::ProgressReporter;
use crate::source::{find_source_files, DirectoryListing};

/// How a batch ended when no error rejected it
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every job ran; see the report for per-job results
    Completed(BatchReport),
    /// The target directory holds no eligible source files
    NoInputFiles { target: PathBuf },
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            BatchOutcome::Completed(report) => Some(report),
            BatchOutcome::NoInputFiles { .. } => None,
        }
    }
}

/// Jobs for one batch, plus the eligible files that cannot become jobs
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub jobs: Vec<ConversionJob>,
    /// Lossy names of eligible files whose name is not valid UTF-8
    pub skipped: Vec<String>,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.skipped.is_empty()
    }
}

/// Converts every PDF in a target directory to EPUB.
///
/// Each call to [`EpubConverter::convert`] builds its own scheduler, so several
/// batches can run in one process without sharing state.
pub struct EpubConverter {
    dirs: DirectoryPair,
    config: ConversionConfig,
    converter: Arc<dyn Converter>,
}

impl EpubConverter {
    /// Create a converter that shells out to the configured `ebook-convert`
    pub fn new(dirs: DirectoryPair, config: ConversionConfig) -> ConversionResult<Self> {
        let converter = EbookConvert::new(config.converter_path.clone()).with_timeout(config.timeout);
        Self::with_converter(dirs, config, Arc::new(converter))
    }

    /// Create a converter around any [`Converter`] implementation
    pub fn with_converter(
        dirs: DirectoryPair,
        config: ConversionConfig,
        converter: Arc<dyn Converter>,
    ) -> ConversionResult<Self> {
        config.validate().map_err(ConversionError::configuration)?;
        Ok(Self {
            dirs,
            config,
            converter,
        })
    }

    pub fn dirs(&self) -> &DirectoryPair {
        &self.dirs
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Probe the external converter, returning its version line
    pub async fn check_converter(&self) -> ConversionResult<String> {
        self.converter
            .validate()
            .await
            .map_err(ConversionError::ConverterUnavailable)
    }

    /// Enumerate the target directory and assign each source a unique safe name.
    ///
    /// Safe names avoid every entry of the target directory, and their intermediate
    /// outputs avoid every entry of the output directory and every final output of
    /// the batch.
    pub async fn plan(&self) -> ConversionResult<BatchPlan> {
        let dirs = self.dirs.clone();
        let extension = self.config.source_extension.clone();
        let (listing, output_entries) = tokio::task::spawn_blocking(move || {
            let listing = find_source_files(&dirs.target, &extension)
                .map_err(|e| ConversionError::target_unreadable(&dirs.target, e))?;
            let output_entries = if dirs.is_in_place() {
                listing.entries.clone()
            } else {
                existing_entries(&dirs.output, &extension)
                    .map_err(|e| ConversionError::output_directory(&dirs.output, e))?
            };
            Ok::<_, ConversionError>((listing, output_entries))
        })
        .await
        .map_err(|e| ConversionError::internal(format!("directory scan failed: {e}")))??;

        let target_extension = &self.config.target_extension;
        let final_outputs: Vec<String> = listing
            .sources
            .iter()
            .map(|name| replace_extension(name, target_extension))
            .collect();

        let DirectoryListing {
            sources,
            entries,
            skipped,
        } = listing;
        let mut allocator = SafeNameAllocator::with_existing(entries)
            .with_outputs(target_extension, output_entries.into_iter().chain(final_outputs));

        let jobs = sources
            .into_iter()
            .map(|name| {
                let safe = allocator.allocate(&name);
                debug!(file = %name, safe = %safe, "allocated safe name");
                ConversionJob::new(
                    name,
                    safe,
                    &self.dirs.target,
                    &self.dirs.output,
                    target_extension,
                )
            })
            .collect();
        Ok(BatchPlan { jobs, skipped })
    }

    /// Run the whole batch.
    ///
    /// Returns [`BatchOutcome::NoInputFiles`] without touching the filesystem when
    /// there is nothing to convert. The output directory is created once, before
    /// any job starts.
    pub async fn convert(&self) -> ConversionResult<BatchOutcome> {
        let BatchPlan { jobs, skipped } = self.plan().await?;
        if jobs.is_empty() && skipped.is_empty() {
            info!(target = %self.dirs.target.display(), "no input files");
            return Ok(BatchOutcome::NoInputFiles {
                target: self.dirs.target.clone(),
            });
        }

        if !self.dirs.is_in_place() {
            debug!(output = %self.dirs.output.display(), "ensuring output directory");
            tokio::fs::create_dir_all(&self.dirs.output)
                .await
                .map_err(|e| ConversionError::output_directory(&self.dirs.output, e))?;
        }

        let progress = ProgressReporter::new(jobs.len() as u64, self.config.show_progress);
        let scheduler = BatchScheduler::new(self.config.concurrency, self.config.failure_policy);
        let mut report = scheduler
            .run(Arc::clone(&self.converter), jobs, &progress)
            .await?;
        report.total += skipped.len();
        report.skipped = skipped;
        Ok(BatchOutcome::Completed(report))
    }
}

/// Entry names of `dir`, or nothing when it does not exist yet
fn existing_entries(dir: &Path, extension: &str) -> io::Result<Vec<String>> {
    match find_source_files(dir, extension) {
        Ok(listing) => Ok(listing.entries),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

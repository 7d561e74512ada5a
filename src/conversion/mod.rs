//! PDF to EPUB batch conversion module
//!
//! This module contains the external converter seam, the per-file worker, the
//! bounded scheduler, configuration, and batch statistics.

pub mod batch;
pub mod config;
pub mod converter;
pub mod engine;
pub mod stats;
pub mod worker;

pub use batch::BatchScheduler;
pub use config::{default_concurrency, ConversionConfig, FailurePolicy};
pub use converter::{Converter, ConverterError, EbookConvert, DEFAULT_CONVERTER};
pub use engine::{BatchOutcome, BatchPlan, EpubConverter};
pub use stats::{BatchReport, BatchSummary, FailureSummary};
pub use worker::{run_job, ConversionJob, JobOutcome};

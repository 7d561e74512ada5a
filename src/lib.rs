//! PDF to EPUB Batch Converter
//!
//! Converts every PDF in a directory to EPUB by running calibre's
//! `ebook-convert` once per file, several files at a time.

pub mod cli;
pub mod conversion;
pub mod error;
pub mod naming;
pub mod progress;
pub mod source;

// Re-export commonly used types
pub use cli::path_mapping::DirectoryPair;
pub use conversion::{
    BatchOutcome, BatchReport, ConversionConfig, ConversionJob, Converter, ConverterError,
    EbookConvert, EpubConverter, FailurePolicy,
};
pub use error::{ConversionError, ConversionResult, JobError, Stage};
pub use naming::sanitize;

/// Convert the PDFs in `target` into `output` (or next to them) with default settings
pub async fn convert_directory(
    target: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
) -> ConversionResult<BatchOutcome> {
    let dirs = DirectoryPair::from_current_dir(target, output)
        .map_err(ConversionError::WorkingDirectory)?;
    let converter = EpubConverter::new(dirs, ConversionConfig::default())?;
    converter.convert().await
}

//! Discovery of source documents in the target directory

pub mod directory;
pub mod filter;

pub use directory::{find_source_files, DirectoryListing};

/// Extension of the documents fed to the converter
pub const SOURCE_EXTENSION: &str = "pdf";

/// Extension of the documents the converter produces
pub const TARGET_EXTENSION: &str = "epub";

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::filter;

/// Entries of a target directory, split into convertible sources and everything else
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// File names eligible for conversion, in directory listing order
    pub sources: Vec<String>,
    /// Every entry name in the directory, sources included
    pub entries: Vec<String>,
    /// Eligible files that cannot be converted because their name is not UTF-8,
    /// rendered lossily
    pub skipped: Vec<String>,
}

impl DirectoryListing {
    /// True when the directory holds no eligible file, convertible or not
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.skipped.is_empty()
    }
}

/// List the regular files directly inside `dir` whose extension is `extension`.
///
/// Fails if `dir` is missing, unreadable or not a directory. Entries that cannot
/// be inspected (dangling symlinks, races with deletion) are skipped.
pub fn find_source_files(dir: &Path, extension: &str) -> Result<DirectoryListing, io::Error> {
    let metadata = fs::metadata(dir)?;
    if !metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} is not a directory", dir.display()),
        ));
    }

    let mut listing = DirectoryListing::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                warn!(error = %err, "skipping unreadable directory entry");
                // still occupies its name
                if let Some(name) = err.path().and_then(Path::file_name) {
                    listing.entries.push(name.to_string_lossy().into_owned());
                }
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let eligible = entry.file_type().is_file() && filter::has_extension(entry.path(), extension);

        match entry.file_name().to_str() {
            Some(exact) if eligible => listing.sources.push(exact.to_string()),
            None if eligible => {
                warn!(name = %name, "skipping file whose name is not valid UTF-8");
                listing.skipped.push(name.clone());
            }
            _ => {}
        }
        listing.entries.push(name);
    }

    debug!(
        dir = %dir.display(),
        sources = listing.sources.len(),
        entries = listing.entries.len(),
        skipped = listing.skipped.len(),
        "enumerated target directory"
    );
    Ok(listing)
}

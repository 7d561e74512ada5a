//! Filesystem and shell safe file names for the converter's intermediate files

use std::collections::HashSet;
use std::path::Path;

/// Characters that survive sanitizing, besides ASCII alphanumerics
const ALLOWED_PUNCTUATION: &[char] = &['_', '-', '.', '/'];

/// Replacement for every character outside the allowed set
const REPLACEMENT: char = '_';

/// Return true if `c` can appear in a safe name unchanged (ignoring case)
pub fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c)
}

/// Lower-case `name` and replace each character outside `[a-zA-Z0-9_\-./]` with `_`.
///
/// The mapping is deterministic and idempotent but not reversible; callers keep
/// the original name next to the safe one.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if is_allowed(c) { c } else { REPLACEMENT })
        .collect()
}

/// Hands out safe names that are unique within one directory.
///
/// Seeded with every name already present in the source directory, so an allocated
/// name never points at an existing file other than the one being renamed. With
/// [`SafeNameAllocator::with_outputs`] the converter's intermediate output name is
/// checked against the output directory as well.
#[derive(Debug, Default)]
pub struct SafeNameAllocator {
    taken: HashSet<String>,
    outputs: Option<OutputNames>,
}

/// Names occupied in the output directory, and the extension produced there
#[derive(Debug)]
struct OutputNames {
    extension: String,
    taken: HashSet<String>,
}

impl SafeNameAllocator {
    /// Create an allocator that treats `existing` names as occupied
    pub fn with_existing<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: existing.into_iter().map(Into::into).collect(),
            outputs: None,
        }
    }

    /// Also reject names whose `extension` counterpart is one of `existing`.
    ///
    /// `existing` should hold the output directory's entries plus the final output
    /// name of every job in the batch.
    pub fn with_outputs<I, S>(mut self, extension: &str, existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = Some(OutputNames {
            extension: extension.to_string(),
            taken: existing.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Allocate a safe name for `original`.
    ///
    /// Already-safe names are returned unchanged. Otherwise the sanitized name gets a
    /// numeric suffix before its extension until neither it nor its output name
    /// collides.
    pub fn allocate(&mut self, original: &str) -> String {
        let safe = sanitize(original);
        if safe == original {
            self.claim(&safe);
            return safe;
        }

        let mut candidate = safe.clone();
        let mut counter = 1usize;
        while !self.is_free(&candidate, original) {
            candidate = with_suffix(&safe, counter);
            counter += 1;
        }
        self.claim(&candidate);
        candidate
    }

    fn is_free(&self, candidate: &str, original: &str) -> bool {
        if self.taken.contains(candidate) {
            return false;
        }
        match &self.outputs {
            Some(outputs) => {
                let output = replace_extension(candidate, &outputs.extension);
                // the job's own final name is about to be written anyway
                output == replace_extension(original, &outputs.extension)
                    || !outputs.taken.contains(&output)
            }
            None => true,
        }
    }

    fn claim(&mut self, name: &str) {
        self.taken.insert(name.to_string());
        if let Some(outputs) = &mut self.outputs {
            outputs
                .taken
                .insert(replace_extension(name, &outputs.extension));
        }
    }
}

/// Insert `_<n>` between the stem and the extension of `name`
fn with_suffix(name: &str, n: usize) -> String {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            format!("{}_{}.{}", stem.to_string_lossy(), n, ext.to_string_lossy())
        }
        _ => format!("{}_{}", name, n),
    }
}

/// Swap the extension of `name` for `extension`, keeping the basename.
///
/// Only the final extension is replaced, so `report.pdf.pdf` becomes
/// `report.pdf.epub`.
pub fn replace_extension(name: &str, extension: &str) -> String {
    let mut path = Path::new(name).to_path_buf();
    path.set_extension(extension);
    path.to_string_lossy().into_owned()
}

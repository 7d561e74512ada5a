use std::path::Path;

/// Return true if the path's final extension is exactly `extension`
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

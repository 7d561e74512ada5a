use std::path::{Component, Path, PathBuf};

/// Resolve a user supplied directory against `base` into an absolute, lexically
/// normalized path. `None` means the current directory.
///
/// No filesystem access happens here: `..` is folded against the preceding
/// component and symlinks are left alone. Resolving an already resolved path
/// returns it unchanged.
pub fn resolve_dir(base: &Path, input: Option<&Path>) -> PathBuf {
    let input = input.unwrap_or_else(|| Path::new("."));
    let joined = if input.is_absolute() {
        input.to_path_buf()
    } else {
        base.join(input)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // ".." at the root stays at the root
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Target and output directories of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPair {
    pub target: PathBuf,
    pub output: PathBuf,
}

impl DirectoryPair {
    /// Resolve both directories against `base`; the output defaults to the target.
    pub fn resolve(base: &Path, target: Option<&Path>, output: Option<&Path>) -> Self {
        let target = resolve_dir(base, target);
        let output = match output {
            Some(output) => resolve_dir(base, Some(output)),
            None => target.clone(),
        };
        Self { target, output }
    }

    /// Resolve against the process working directory
    pub fn from_current_dir(
        target: Option<&Path>,
        output: Option<&Path>,
    ) -> std::io::Result<Self> {
        let base = std::env::current_dir()?;
        Ok(Self::resolve(&base, target, output))
    }

    /// True when converted files are written next to their sources
    pub fn is_in_place(&self) -> bool {
        self.target == self.output
    }
}

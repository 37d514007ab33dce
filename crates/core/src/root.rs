//! The working root: the single directory every tool is confined to.
//!
//! A `WorkingRoot` is created once at startup and handed by reference to each
//! tool call. It is never part of the argument set the model fills in.

use std::path::{Path, PathBuf};

/// An absolute, canonical directory path fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingRoot {
    path: PathBuf,
}

impl WorkingRoot {
    /// Canonicalize `path` and wrap it. Fails if the path does not exist or
    /// is not a directory.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// The canonical root path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for WorkingRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();

        let root = WorkingRoot::new(nested.join("..").join("sub")).unwrap();
        assert_eq!(root.as_path(), nested.canonicalize().unwrap());
        assert!(root.as_path().is_absolute());
    }

    #[test]
    fn file_is_not_a_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(WorkingRoot::new(&file).is_err());
    }

    #[test]
    fn missing_dir_is_not_a_root() {
        assert!(WorkingRoot::new("/nonexistent/rootbound/dir").is_err());
    }
}

//! Path validation: filesystem sandboxing to the working root.
//!
//! Every file-touching tool resolves its model-supplied path through
//! [`resolve`] before doing anything else. A path is accepted only if, once
//! joined onto the root, normalized, and with symlinks of its existing
//! ancestors resolved, it is the root itself or lies beneath it.

use std::path::{Component, Path, PathBuf};

use rootbound_core::error::ToolError;
use rootbound_core::root::WorkingRoot;
use tracing::debug;

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' is outside the working root")]
    OutsideRoot { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

impl From<PathValidationError> for ToolError {
    fn from(err: PathValidationError) -> Self {
        match err {
            PathValidationError::OutsideRoot { path } => ToolError::OutsideRoot { path },
            PathValidationError::CanonicalizeFailed { path, reason } => ToolError::Io {
                operation: "resolve".into(),
                path,
                reason,
            },
        }
    }
}

/// Resolve `relative` against `root`, rejecting anything that escapes it.
///
/// Works whether or not the target exists. An absolute `relative` replaces
/// the root entirely and is then checked like any other path.
pub fn resolve(root: &WorkingRoot, relative: &str) -> Result<PathBuf, PathValidationError> {
    let joined = root.as_path().join(relative);
    let normalized = normalize_lexically(&joined);
    let resolved = canonicalize_existing_prefix(&normalized).map_err(|e| {
        PathValidationError::CanonicalizeFailed {
            path: relative.into(),
            reason: e.to_string(),
        }
    })?;

    if resolved.starts_with(root.as_path()) {
        Ok(resolved)
    } else {
        debug!(path = %relative, resolved = %resolved.display(), "Rejected path outside root");
        Err(PathValidationError::OutsideRoot {
            path: relative.into(),
        })
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Dangling links followed by hand before giving up (Linux `MAXSYMLINKS`).
const MAX_LINK_DEPTH: u32 = 40;

/// Canonicalize the longest existing ancestor of `path` (resolving symlinks)
/// and re-append the components that do not exist yet.
///
/// A dangling symlink exists as an entry even though its target does not,
/// so it is followed to wherever it points rather than treated as missing.
fn canonicalize_existing_prefix(path: &Path) -> std::io::Result<PathBuf> {
    canonicalize_with_depth(path, 0)
}

fn canonicalize_with_depth(path: &Path, depth: u32) -> std::io::Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(meta) = std::fs::symlink_metadata(current) {
            let mut resolved = if meta.file_type().is_symlink() && !current.exists() {
                follow_dangling_link(current, depth)?
            } else {
                current.canonicalize()?
            };
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
}

/// Where a symlink with a missing target would lead once its target is created.
fn follow_dangling_link(link: &Path, depth: u32) -> std::io::Result<PathBuf> {
    if depth >= MAX_LINK_DEPTH {
        return Err(std::io::Error::other("too many levels of symbolic links"));
    }
    let target = std::fs::read_link(link)?;
    let parent = match link.parent() {
        Some(parent) => parent.canonicalize()?,
        None => PathBuf::from("/"),
    };
    let next = normalize_lexically(&parent.join(target));
    canonicalize_with_depth(&next, depth + 1)
}

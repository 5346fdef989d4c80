//! Filesystem plumbing around the storage root: listing for the browser
//! UI, safe deletion, and usage accounting.

mod delete;
mod list;
mod usage;

pub use delete::delete_entry;
pub use list::list_directory;
pub use usage::storage_usage;

use std::path::{Path, PathBuf};

/// Errors produced by file operations.
#[derive(Debug, thiserror::Error)]
pub enum FileOpsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

/// Resolves `rel` to an existing regular file under `root` for download.
///
/// Hidden entries (the temp directory included) are not served.
pub fn locate_file(root: &Path, rel: &str) -> Result<PathBuf, FileOpsError> {
    if rel.trim().is_empty() {
        return Err(FileOpsError::InvalidTarget("empty path".into()));
    }
    if rel.split('/').any(|part| part.starts_with('.')) {
        return Err(FileOpsError::NotFound(rel.to_string()));
    }
    let path = locate_under_root(root, rel)?;
    if !path.is_file() {
        return Err(FileOpsError::NotFound(rel.to_string()));
    }
    Ok(path)
}

/// Resolves `rel` under `root` without creating anything, verifying the
/// canonical result stays inside the root.
fn locate_under_root(root: &Path, rel: &str) -> Result<PathBuf, FileOpsError> {
    landrop_transfer::validate_relative_path(rel)
        .map_err(|e| FileOpsError::InvalidTarget(e.to_string()))?;

    let joined = if rel.is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    };
    let canonical = joined
        .canonicalize()
        .map_err(|_| FileOpsError::NotFound(rel.to_string()))?;
    let canonical_root = root.canonicalize()?;
    if !canonical.starts_with(&canonical_root) {
        return Err(FileOpsError::InvalidTarget(format!(
            "path escapes storage root: {rel}"
        )));
    }
    Ok(canonical)
}

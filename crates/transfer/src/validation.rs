use std::path::{Component, Path, PathBuf};

use crate::TransferError;

/// Validates a client-supplied path relative to the storage root.
///
/// An empty path means the root itself. Rejects absolute paths, parent
/// directory traversal (`..`) and Windows prefix components, before any
/// filesystem access happens.
pub fn validate_relative_path(rel: &str) -> Result<(), TransferError> {
    if rel.is_empty() {
        return Ok(());
    }

    let path = Path::new(rel);

    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {rel}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {rel}"
                )));
            }
            Component::Prefix(_) => {
                return Err(TransferError::InvalidPath(format!(
                    "path prefix not allowed: {rel}"
                )));
            }
            Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {rel}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

/// Validates an upload's file name: one plain path component, no
/// separators, not a dot entry.
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TransferError::InvalidPath("empty file name".into()));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(TransferError::InvalidPath(format!(
            "invalid file name: {name}"
        )));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(TransferError::InvalidPath(format!(
            "file name must not contain separators: {name}"
        )));
    }
    Ok(())
}

/// Resolves `rel` to an absolute directory under `root`, creating it if
/// needed, and verifies the canonicalized result stays inside the root.
///
/// The canonicalization step catches what component checks alone cannot
/// (symlinks pointing out of the root).
pub fn resolve_under_root(root: &Path, rel: &str) -> Result<PathBuf, TransferError> {
    validate_relative_path(rel)?;

    let joined = if rel.is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    };
    std::fs::create_dir_all(&joined)?;

    let canonical_root = root.canonicalize()?;
    let canonical = joined.canonicalize()?;
    if !canonical.starts_with(&canonical_root) {
        return Err(TransferError::InvalidPath(format!(
            "path escapes storage root: {rel}"
        )));
    }

    Ok(canonical)
}

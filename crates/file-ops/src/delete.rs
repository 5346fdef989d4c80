use std::path::Path;

use crate::{FileOpsError, locate_under_root};

/// Deletes a file or directory under the storage root.
///
/// Refuses the root itself and anything hidden, which covers the
/// in-flight temp directory: orphans belong to the reaper, not to the
/// delete route. Directories are removed recursively.
pub fn delete_entry(root: &Path, rel: &str) -> Result<(), FileOpsError> {
    if rel.trim().is_empty() {
        return Err(FileOpsError::InvalidTarget(
            "refusing to delete the storage root".into(),
        ));
    }
    if rel.split('/').any(|part| part.starts_with('.')) {
        return Err(FileOpsError::InvalidTarget(format!(
            "refusing to delete hidden entry: {rel}"
        )));
    }

    let target = locate_under_root(root, rel)?;
    if target == root.canonicalize()? {
        return Err(FileOpsError::InvalidTarget(
            "refusing to delete the storage root".into(),
        ));
    }

    let meta = std::fs::symlink_metadata(&target)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(&target)?;
    } else {
        std::fs::remove_file(&target)?;
    }

    tracing::info!(path = %rel, "deleted entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use landrop_transfer::TEMP_DIR_NAME;
    use tempfile::TempDir;

    #[test]
    fn deletes_file() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("a.txt"), b"x").unwrap();
        delete_entry(root.path(), "a.txt").unwrap();
        assert!(!root.path().join("a.txt").exists());
    }

    #[test]
    fn deletes_directory_recursively() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("d/e")).unwrap();
        std::fs::write(root.path().join("d/e/f.txt"), b"x").unwrap();
        delete_entry(root.path(), "d").unwrap();
        assert!(!root.path().join("d").exists());
    }

    #[test]
    fn refuses_root() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            delete_entry(root.path(), ""),
            Err(FileOpsError::InvalidTarget(_))
        ));
    }

    #[test]
    fn refuses_temp_directory() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join(TEMP_DIR_NAME)).unwrap();
        assert!(matches!(
            delete_entry(root.path(), TEMP_DIR_NAME),
            Err(FileOpsError::InvalidTarget(_))
        ));
    }

    #[test]
    fn refuses_traversal() {
        let root = TempDir::new().unwrap();
        assert!(delete_entry(root.path(), "../outside").is_err());
    }

    #[test]
    fn missing_target_is_not_found() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            delete_entry(root.path(), "ghost.txt"),
            Err(FileOpsError::NotFound(_))
        ));
    }
}

use std::path::Path;

use crate::FileOpsError;

/// Sums the size of every visible file under the storage root.
///
/// The hidden temp directory is excluded: in-flight bytes are not yet
/// "stored". Reported by the status route next to configured limits.
pub fn storage_usage(root: &Path) -> Result<u64, FileOpsError> {
    let mut total = 0u64;
    walk(root, &mut total)?;
    Ok(total)
}

fn walk(dir: &Path, total: &mut u64) -> Result<(), FileOpsError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let meta = entry.metadata()?;
        if meta.is_dir() {
            walk(&entry.path(), total)?;
        } else if meta.is_file() {
            *total += meta.len();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use landrop_transfer::TEMP_DIR_NAME;
    use tempfile::TempDir;

    #[test]
    fn sums_nested_files() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("a.bin"), [0u8; 10]).unwrap();
        std::fs::create_dir_all(root.path().join("sub")).unwrap();
        std::fs::write(root.path().join("sub/b.bin"), [0u8; 30]).unwrap();

        assert_eq!(storage_usage(root.path()).unwrap(), 40);
    }

    #[test]
    fn temp_directory_does_not_count() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join(TEMP_DIR_NAME)).unwrap();
        std::fs::write(root.path().join(TEMP_DIR_NAME).join("temp_x_t"), [0u8; 99]).unwrap();
        std::fs::write(root.path().join("real.bin"), [0u8; 5]).unwrap();

        assert_eq!(storage_usage(root.path()).unwrap(), 5);
    }
}

use std::path::Path;

use chrono::{DateTime, Utc};

use landrop_protocol::{DirEntry, FileRecord, Listing};

use crate::{FileOpsError, locate_under_root};

/// Lists one directory under the storage root for the browser UI.
///
/// Files become [`FileRecord`]s (timestamp from mtime), subdirectories
/// become [`DirEntry`]s for navigation. Hidden entries, including the
/// in-flight temp directory, are excluded. Both lists are sorted
/// case-insensitively by name.
pub fn list_directory(root: &Path, rel: &str) -> Result<Listing, FileOpsError> {
    let dir = locate_under_root(root, rel)?;
    if !dir.is_dir() {
        return Err(FileOpsError::NotFound(rel.to_string()));
    }

    let mut files = Vec::new();
    let mut directories = Vec::new();

    for entry in std::fs::read_dir(&dir)? {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };

        let relative_path = if rel.is_empty() {
            name.clone()
        } else {
            format!("{rel}/{name}")
        };

        if meta.is_dir() {
            directories.push(DirEntry {
                name,
                relative_path,
            });
        } else if meta.is_file() {
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            files.push(FileRecord::new(
                name.clone(),
                name,
                meta.len(),
                relative_path,
                modified,
            ));
        }
    }

    files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    directories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Listing {
        path: rel.to_string(),
        files,
        directories,
    })
}

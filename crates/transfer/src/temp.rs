use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;

use landrop_protocol::FileRecord;

use crate::TransferError;
use crate::checksum::checksum_bytes;

/// Directory under the storage root that holds in-flight temp files.
///
/// Hidden so listings skip it, and kept inside the root so promotion is
/// a same-filesystem rename in the common case.
pub const TEMP_DIR_NAME: &str = ".landrop-tmp";

/// Derives the filename component of a temp name: the first 16
/// alphanumeric characters of the base64 encoding of the original name.
pub fn file_name_hash(file_name: &str) -> String {
    let encoded = BASE64.encode(file_name.as_bytes());
    let hash: String = encoded
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(16)
        .collect();
    if hash.is_empty() { "file".into() } else { hash }
}

/// Server-side accumulator for chunked uploads.
///
/// A temp file's name is the whole session state: no record of an
/// in-flight upload is kept in memory between requests. Chunks are
/// written at their declared byte offset, so a retried or duplicated
/// chunk overwrites its own bytes instead of corrupting the file.
#[derive(Debug, Clone)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the storage root and temp directory if absent.
    pub fn ensure_layout(&self) -> Result<(), TransferError> {
        std::fs::create_dir_all(self.temp_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR_NAME)
    }

    /// Mints the per-upload session token returned to the client on
    /// chunk 0 and echoed on every later chunk.
    pub fn mint_token() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Temp file name for one logical upload.
    pub fn temp_name(file_name: &str, token: &str) -> String {
        format!("temp_{}_{}", file_name_hash(file_name), token)
    }

    fn temp_path(&self, temp_name: &str) -> PathBuf {
        self.temp_dir().join(temp_name)
    }

    /// Writes one chunk at its byte offset.
    ///
    /// `create` is set for chunk 0: the temp file is created (truncating
    /// any stale leftover under the same name). For later chunks the file
    /// must already exist; a missing file means the session was never
    /// started or was reaped.
    ///
    /// A non-empty `checksum` is verified against the received bytes
    /// before anything touches disk.
    pub fn write_chunk(
        &self,
        temp_name: &str,
        offset: u64,
        data: &[u8],
        checksum: &str,
        create: bool,
    ) -> Result<(), TransferError> {
        if !checksum.is_empty() && checksum_bytes(data) != checksum {
            return Err(TransferError::ChecksumMismatch);
        }

        let path = self.temp_path(temp_name);
        let mut file = if create {
            std::fs::create_dir_all(self.temp_dir())?;
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)?
        } else {
            if !path.exists() {
                return Err(TransferError::SessionNotFound(temp_name.to_string()));
            }
            std::fs::OpenOptions::new().write(true).open(&path)?
        };

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Promotes a finished temp file to its final name under `dest_dir`.
    ///
    /// The final name starts as `original_name` and gets a `_<n>` suffix
    /// while the candidate already exists, so an existing unrelated file
    /// is never overwritten. Promotion is a rename; if that fails (e.g.
    /// the destination is on another filesystem) it falls back to
    /// copy-then-delete. The returned record's size comes from a fresh
    /// stat of the promoted file, not from client-declared totals.
    pub fn finalize(
        &self,
        temp_name: &str,
        dest_dir: &Path,
        dest_rel: &str,
        original_name: &str,
    ) -> Result<FileRecord, TransferError> {
        let temp_path = self.temp_path(temp_name);
        if !temp_path.exists() {
            return Err(TransferError::SessionNotFound(temp_name.to_string()));
        }

        let (final_name, final_path) = next_free_name(dest_dir, original_name);
        promote(&temp_path, &final_path)?;

        let size = std::fs::metadata(&final_path)?.len();
        let relative_path = if dest_rel.is_empty() {
            final_name.clone()
        } else {
            format!("{dest_rel}/{final_name}")
        };

        tracing::info!(
            name = %final_name,
            bytes = size,
            path = %relative_path,
            "upload finalized"
        );

        Ok(FileRecord::new(
            final_name,
            original_name,
            size,
            relative_path,
            Utc::now(),
        ))
    }

    /// Deletes temp files older than `max_age` and returns how many.
    ///
    /// In-flight uploads are safe: every chunk write refreshes the temp
    /// file's mtime. Anything older than the cutoff is an orphan from an
    /// aborted or failed upload.
    pub fn sweep(&self, max_age: Duration) -> Result<usize, TransferError> {
        let dir = self.temp_dir();
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0usize;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let age = meta
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .unwrap_or_default();
            if age > max_age {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => {
                        removed += 1;
                        tracing::debug!(file = %entry.path().display(), "reaped orphan temp file");
                    }
                    Err(e) => {
                        tracing::warn!(file = %entry.path().display(), error = %e, "failed to reap temp file");
                    }
                }
            }
        }
        Ok(removed)
    }
}

/// Finds the first free `<stem>_<n>.<ext>` name under `dir`.
fn next_free_name(dir: &Path, original_name: &str) -> (String, PathBuf) {
    let candidate = dir.join(original_name);
    if !candidate.exists() {
        return (original_name.to_string(), candidate);
    }

    let (stem, ext) = match original_name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s, Some(e)),
        _ => (original_name, None),
    };

    let mut counter = 1u32;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let path = dir.join(&name);
        if !path.exists() {
            return (name, path);
        }
        counter += 1;
    }
}

/// Moves `temp` to `dest`, preferring an atomic rename.
fn promote(temp: &Path, dest: &Path) -> Result<(), TransferError> {
    match std::fs::rename(temp, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // Cross-device move: copy the data, then drop the temp file.
            tracing::debug!(error = %rename_err, "rename failed, falling back to copy");
            std::fs::copy(temp, dest)?;
            if let Err(e) = std::fs::remove_file(temp) {
                // The final file is already durable; the leftover temp
                // file is an orphan for the reaper.
                tracing::warn!(file = %temp.display(), error = %e, "failed to remove temp file after copy");
            }
            Ok(())
        }
    }
}

//! Chunked upload reassembly.
//!
//! A large file is split client-side into sequential byte-range chunks
//! ([`ChunkPlan`], [`ChunkReader`]) and reconstructed server-side in a
//! temp file ([`TempStore`]) that is atomically promoted to its final
//! name once the last chunk lands.

mod checksum;
mod plan;
mod temp;
mod validation;

pub use checksum::checksum_bytes;
pub use plan::{ChunkPlan, ChunkReader, FileChunk};
pub use temp::{TEMP_DIR_NAME, TempStore, file_name_hash};
pub use validation::{resolve_under_root, validate_file_name, validate_relative_path};

/// Smallest chunk size the planner will use, regardless of configuration.
pub const MIN_CHUNK_SIZE: u64 = 1024 * 1024;

/// Chunk size used when nothing is configured: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk checksum mismatch")]
    ChecksumMismatch,

    #[error("upload session not found: {0}")]
    SessionNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

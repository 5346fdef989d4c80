use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::checksum::checksum_bytes;
use crate::{MIN_CHUNK_SIZE, TransferError};

/// Chunk boundaries for one file.
///
/// A file no larger than the chunk size is sent whole, in a single
/// request with no chunk metadata. Anything larger is split into
/// `ceil(size / chunk_size)` ranges; every chunk is full-sized except
/// possibly the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub file_size: u64,
    pub chunk_size: u64,
}

impl ChunkPlan {
    /// Plans chunking for a file of `file_size` bytes.
    ///
    /// The configured chunk size is clamped to at least
    /// [`MIN_CHUNK_SIZE`] (1 MiB).
    pub fn for_size(file_size: u64, configured_chunk_size: u64) -> Self {
        Self {
            file_size,
            chunk_size: configured_chunk_size.max(MIN_CHUNK_SIZE),
        }
    }

    /// Whether the file needs chunked transfer at all.
    pub fn is_chunked(&self) -> bool {
        self.file_size > self.chunk_size
    }

    /// Number of chunks (1 for a whole-file upload).
    pub fn total_chunks(&self) -> u32 {
        if !self.is_chunked() {
            1
        } else {
            self.file_size.div_ceil(self.chunk_size) as u32
        }
    }

    /// Byte offset of chunk `index`.
    pub fn offset(&self, index: u32) -> u64 {
        index as u64 * self.chunk_size
    }

    /// Length in bytes of chunk `index`.
    pub fn chunk_len(&self, index: u32) -> usize {
        let start = self.offset(index);
        let end = (start + self.chunk_size).min(self.file_size);
        (end - start) as usize
    }
}

/// One chunk read from a local file, ready to transmit.
#[derive(Debug, Clone)]
pub struct FileChunk {
    pub index: u32,
    pub offset: u64,
    pub data: Vec<u8>,
    /// SHA-256 hex of `data`.
    pub checksum: String,
}

/// Reads a file chunk by chunk according to a [`ChunkPlan`].
pub struct ChunkReader {
    file: std::fs::File,
    plan: ChunkPlan,
    next_index: u32,
}

impl ChunkReader {
    /// Opens `path` and plans its transfer with the given chunk size.
    pub fn open(path: &Path, configured_chunk_size: u64) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            plan: ChunkPlan::for_size(file_size, configured_chunk_size),
            next_index: 0,
        })
    }

    pub fn plan(&self) -> ChunkPlan {
        self.plan
    }

    /// Reads the next chunk. Returns `None` once every chunk was read.
    pub fn next_chunk(&mut self) -> Result<Option<FileChunk>, TransferError> {
        if self.next_index >= self.plan.total_chunks() {
            return Ok(None);
        }

        let index = self.next_index;
        let offset = self.plan.offset(index);
        let mut data = vec![0u8; self.plan.chunk_len(index)];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut data)?;

        self.next_index += 1;
        let checksum = checksum_bytes(&data);
        Ok(Some(FileChunk {
            index,
            offset,
            data,
            checksum,
        }))
    }
}

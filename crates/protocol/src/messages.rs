use serde::{Deserialize, Serialize};

use crate::records::{DirEntry, FileRecord};

/// Chunk metadata carried alongside the binary part of a chunked upload.
///
/// The presence of `chunk_index`/`total_chunks`/`file_name` together marks
/// a request as chunked; a plain whole-file upload carries none of them.
/// `upload_id` is minted by the server on chunk 0 and echoed by the client
/// on every later chunk so all chunks of one logical upload resolve to the
/// same temp file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMeta {
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub file_name: String,
    /// Byte offset of this chunk within the file.
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    /// SHA-256 hex of the chunk bytes; empty means no verification.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

impl ChunkMeta {
    /// Whether this is the final chunk of the upload.
    pub fn is_last(&self) -> bool {
        self.chunk_index + 1 == self.total_chunks
    }
}

/// Response body of `POST /api/upload`.
///
/// One shape covers all three outcomes: whole-file success, non-final
/// chunk ack, and final-chunk completion. Optional fields are omitted
/// from the JSON when they do not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UploadResponse {
    /// A whole-file upload finished in one request.
    pub fn whole_file(record: FileRecord, upload_path: impl Into<String>) -> Self {
        Self {
            success: true,
            message: format!("uploaded {}", record.name),
            files: vec![record],
            upload_path: Some(upload_path.into()),
            chunk_index: None,
            total_chunks: None,
            upload_id: None,
            completed: None,
        }
    }

    /// A non-final chunk was received and written.
    pub fn chunk_ack(chunk_index: u32, total_chunks: u32, upload_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: format!("chunk {} of {} received", chunk_index + 1, total_chunks),
            files: Vec::new(),
            upload_path: None,
            chunk_index: Some(chunk_index),
            total_chunks: Some(total_chunks),
            upload_id: Some(upload_id.into()),
            completed: Some(false),
        }
    }

    /// The final chunk arrived and the file was promoted.
    pub fn completed(
        record: FileRecord,
        upload_path: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            message: format!("upload of {} complete", record.name),
            files: vec![record],
            upload_path: Some(upload_path.into()),
            chunk_index: None,
            total_chunks: None,
            upload_id: Some(upload_id.into()),
            completed: Some(true),
        }
    }
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response body of `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// The listed path, relative to the storage root.
    pub path: String,
    pub files: Vec<FileRecord>,
    pub directories: Vec<DirEntry>,
}

/// Response body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub name: String,
    pub used_bytes: u64,
    pub used_formatted: String,
    /// 0 means no limit configured.
    #[serde(default)]
    pub max_upload_size: u64,
    pub chunk_size: u64,
}

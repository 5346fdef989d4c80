use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mime::mime_type_for;
use crate::size::format_size;

/// A finished file under the storage root.
///
/// There is no database: the file's existence on disk is its record.
/// This struct is built fresh from a `stat` whenever the file is promoted
/// or listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    /// Final name on disk (may carry a `_<n>` collision suffix).
    pub name: String,
    /// Name the uploader originally asked for.
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    /// Path relative to the storage root, `/`-separated.
    pub relative_path: String,
    /// RFC 3339 timestamp.
    pub uploaded_at: String,
    pub size_formatted: String,
}

impl FileRecord {
    /// Builds a record for a file that was just promoted or stat'ed.
    pub fn new(
        name: impl Into<String>,
        original_name: impl Into<String>,
        size: u64,
        relative_path: impl Into<String>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: mime_type_for(&name).to_string(),
            name,
            original_name: original_name.into(),
            size,
            relative_path: relative_path.into(),
            uploaded_at: uploaded_at.to_rfc3339(),
            size_formatted: format_size(size),
        }
    }
}

/// A directory entry for navigation in the browser UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    /// Path relative to the storage root, `/`-separated.
    pub relative_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fills_derived_fields() {
        let record = FileRecord::new("photo_1.jpg", "photo.jpg", 2048, "pics/photo_1.jpg", Utc::now());
        assert_eq!(record.name, "photo_1.jpg");
        assert_eq!(record.original_name, "photo.jpg");
        assert_eq!(record.mime_type, "image/jpeg");
        assert_eq!(record.size_formatted, "2 KB");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn record_json_field_names() {
        let record = FileRecord::new("a.txt", "a.txt", 1, "a.txt", Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("originalName").is_some());
        assert!(json.get("mimeType").is_some());
        assert!(json.get("relativePath").is_some());
        assert!(json.get("uploadedAt").is_some());
        assert!(json.get("sizeFormatted").is_some());
    }
}

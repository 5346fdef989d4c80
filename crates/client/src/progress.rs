use landrop_protocol::FileRecord;

/// Progress of one file's upload, chunk-count-weighted.
///
/// The fraction is `uploaded_chunks / total_chunks`; a short final
/// chunk weighs the same as a full one, matching what the UI shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FileProgress {
    pub file_name: String,
    pub uploaded_chunks: u32,
    pub total_chunks: u32,
    pub bytes_sent: u64,
}

impl FileProgress {
    pub fn fraction(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        self.uploaded_chunks as f64 / self.total_chunks as f64
    }
}

/// Event emitted while a batch uploads.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    FileStarted {
        file_name: String,
        file_size: u64,
        total_chunks: u32,
    },
    Progress(FileProgress),
    FileCompleted {
        record: FileRecord,
    },
    FileFailed {
        file_name: String,
        error: String,
    },
}

/// Outcome of a multi-file batch.
///
/// Files are independent end-to-end: one failure leaves the others
/// committed, and the summary says so.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub completed: Vec<FileRecord>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        let total = self.completed.len() + self.failed.len();
        if self.failed.is_empty() {
            format!("uploaded {total} file(s)")
        } else {
            format!(
                "some files failed: {} of {total} uploaded, {} failed",
                self.completed.len(),
                self.failed.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn fraction_is_chunk_weighted() {
        let progress = FileProgress {
            file_name: "big.bin".into(),
            uploaded_chunks: 2,
            total_chunks: 3,
            bytes_sent: 10 * 1024 * 1024,
        };
        assert!((progress.fraction() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn summary_reports_partial_failure() {
        let mut report = BatchReport::default();
        report
            .completed
            .push(FileRecord::new("a.txt", "a.txt", 1, "a.txt", Utc::now()));
        report.failed.push(("b.txt".into(), "boom".into()));

        assert!(!report.all_succeeded());
        assert!(report.summary().contains("some files failed"));
    }

    #[test]
    fn summary_reports_success() {
        let report = BatchReport::default();
        assert!(report.all_succeeded());
    }
}

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use landrop_protocol::{FileRecord, UploadResponse};
use landrop_transfer::{ChunkReader, DEFAULT_CHUNK_SIZE};

use crate::ClientError;
use crate::progress::{BatchReport, FileProgress, UploadEvent};
use crate::transport::{ChunkUpload, Transport, WholeFileUpload};

/// Drives file uploads against a [`Transport`].
///
/// Chunks of one file go out strictly in order (chunk K+1 is not sent
/// until chunk K's response settles) because the server reassembles
/// without reordering or buffering. Files of a batch are likewise
/// uploaded one at a time.
pub struct Uploader {
    transport: Arc<dyn Transport>,
    chunk_size: u64,
    max_attempts: u32,
    retry_unit: Duration,
    cancel: CancellationToken,
}

impl Uploader {
    /// Creates an uploader with the default chunk size and retry policy
    /// (3 attempts per chunk, linear 1 s backoff).
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: 3,
            retry_unit: Duration::from_secs(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the chunk threshold. Values below 1 MiB are clamped by the
    /// planner.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Overrides the retry policy. `retry_unit` scales the linear
    /// backoff: the wait after attempt N is `N * retry_unit`.
    pub fn with_retry_policy(mut self, max_attempts: u32, retry_unit: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_unit = retry_unit;
        self
    }

    /// Token for cancelling an in-flight batch. Cancelling stops before
    /// the next chunk; bytes already on the server stay as an orphaned
    /// temp file.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads one file, emitting progress events along the way.
    pub async fn upload_file(
        &self,
        path: &Path,
        dest: &str,
        events: &mpsc::Sender<UploadEvent>,
    ) -> Result<FileRecord, ClientError> {
        let file_name = file_name_of(path)?;
        match self.upload_file_inner(path, &file_name, dest, events).await {
            Ok(record) => {
                let _ = events
                    .send(UploadEvent::FileCompleted {
                        record: record.clone(),
                    })
                    .await;
                Ok(record)
            }
            Err(e) => {
                let _ = events
                    .send(UploadEvent::FileFailed {
                        file_name,
                        error: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    /// Uploads a batch of files sequentially.
    ///
    /// Each file is independent end-to-end: a failure aborts that file
    /// only, and everything already uploaded stays committed.
    pub async fn upload_many(
        &self,
        paths: &[PathBuf],
        dest: &str,
        events: &mpsc::Sender<UploadEvent>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            match self.upload_file(path, dest, events).await {
                Ok(record) => report.completed.push(record),
                Err(ClientError::Cancelled) => {
                    report.failed.push((file_name, "cancelled".into()));
                    break;
                }
                Err(e) => report.failed.push((file_name, e.to_string())),
            }
        }

        report
    }

    async fn upload_file_inner(
        &self,
        path: &Path,
        file_name: &str,
        dest: &str,
        events: &mpsc::Sender<UploadEvent>,
    ) -> Result<FileRecord, ClientError> {
        let mut reader = {
            let path = path.to_path_buf();
            let chunk_size = self.chunk_size;
            tokio::task::spawn_blocking(move || ChunkReader::open(&path, chunk_size))
                .await
                .map_err(join_error)??
        };
        let plan = reader.plan();
        let total_chunks = plan.total_chunks();

        let _ = events
            .send(UploadEvent::FileStarted {
                file_name: file_name.to_string(),
                file_size: plan.file_size,
                total_chunks,
            })
            .await;

        if !plan.is_chunked() {
            return self.upload_whole(reader, file_name, dest, events).await;
        }

        let mut upload_id: Option<String> = None;
        let mut bytes_sent = 0u64;

        loop {
            let (returned, next) = tokio::task::spawn_blocking(move || {
                let mut r = reader;
                let chunk = r.next_chunk();
                (r, chunk)
            })
            .await
            .map_err(join_error)?;
            reader = returned;

            let Some(chunk) = next? else { break };

            let upload = ChunkUpload {
                file_name: file_name.to_string(),
                dest_path: dest.to_string(),
                chunk_index: chunk.index,
                total_chunks,
                offset: chunk.offset,
                upload_id: upload_id.clone(),
                checksum: chunk.checksum.clone(),
                data: chunk.data,
            };
            let chunk_len = upload.data.len() as u64;
            let is_last = chunk.index + 1 == total_chunks;

            let resp = self
                .with_retry(chunk.index, || self.transport.send_chunk(upload.clone()))
                .await?;

            if upload_id.is_none() {
                match resp.upload_id.clone() {
                    Some(id) => upload_id = Some(id),
                    None => {
                        return Err(ClientError::Protocol(
                            "server did not return an uploadId for chunk 0".into(),
                        ));
                    }
                }
            }

            bytes_sent += chunk_len;
            let _ = events
                .send(UploadEvent::Progress(FileProgress {
                    file_name: file_name.to_string(),
                    uploaded_chunks: chunk.index + 1,
                    total_chunks,
                    bytes_sent,
                }))
                .await;

            if is_last {
                if resp.completed != Some(true) {
                    return Err(ClientError::Protocol(
                        "final chunk was not acknowledged as completed".into(),
                    ));
                }
                return record_from(resp);
            }
        }

        Err(ClientError::Protocol("file produced no chunks".into()))
    }

    async fn upload_whole(
        &self,
        mut reader: ChunkReader,
        file_name: &str,
        dest: &str,
        events: &mpsc::Sender<UploadEvent>,
    ) -> Result<FileRecord, ClientError> {
        // A whole-file upload is its single chunk.
        let chunk = tokio::task::spawn_blocking(move || reader.next_chunk())
            .await
            .map_err(join_error)??
            .ok_or_else(|| ClientError::Protocol("file produced no data".into()))?;

        let upload = WholeFileUpload {
            file_name: file_name.to_string(),
            dest_path: dest.to_string(),
            data: chunk.data,
        };
        let bytes = upload.data.len() as u64;

        let resp = self
            .with_retry(0, || self.transport.send_whole_file(upload.clone()))
            .await?;

        let _ = events
            .send(UploadEvent::Progress(FileProgress {
                file_name: file_name.to_string(),
                uploaded_chunks: 1,
                total_chunks: 1,
                bytes_sent: bytes,
            }))
            .await;

        record_from(resp)
    }

    /// Sends one request with up to `max_attempts` tries and linear
    /// backoff between them. Exhaustion aborts the whole file's upload.
    async fn with_retry<F, Fut>(
        &self,
        chunk_index: u32,
        send: F,
    ) -> Result<UploadResponse, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<UploadResponse, ClientError>>,
    {
        let mut last: Option<ClientError> = None;

        for attempt in 1..=self.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            match send().await {
                Ok(resp) if resp.success => return Ok(resp),
                Ok(resp) => {
                    last = Some(ClientError::Protocol(format!(
                        "server reported failure: {}",
                        resp.message
                    )));
                }
                Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
                Err(e) => last = Some(e),
            }

            if attempt < self.max_attempts {
                let delay = self.retry_unit * attempt;
                tracing::warn!(
                    chunk = chunk_index,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "chunk upload failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(ClientError::ExhaustedRetries {
            chunk_index,
            attempts: self.max_attempts,
            source: Box::new(
                last.unwrap_or_else(|| ClientError::Protocol("no attempt was made".into())),
            ),
        })
    }
}

fn record_from(resp: UploadResponse) -> Result<FileRecord, ClientError> {
    resp.files
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Protocol("response carried no file record".into()))
}

fn file_name_of(path: &Path) -> Result<String, ClientError> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a file path: {}", path.display()),
            ))
        })
}

fn join_error(e: tokio::task::JoinError) -> ClientError {
    ClientError::Io(std::io::Error::other(e))
}

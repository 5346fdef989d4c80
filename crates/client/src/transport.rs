use std::future::Future;
use std::pin::Pin;

use landrop_protocol::{ErrorResponse, Listing, StatusResponse, UploadResponse};

use crate::ClientError;

/// A whole-file upload: one request, no chunk metadata.
#[derive(Debug, Clone)]
pub struct WholeFileUpload {
    pub file_name: String,
    pub dest_path: String,
    pub data: Vec<u8>,
}

/// One chunk of a chunked upload.
#[derive(Debug, Clone)]
pub struct ChunkUpload {
    pub file_name: String,
    pub dest_path: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub offset: u64,
    /// Session token from the chunk-0 response; `None` only on chunk 0.
    pub upload_id: Option<String>,
    /// SHA-256 hex of `data`.
    pub checksum: String,
    pub data: Vec<u8>,
}

/// A boxed future returned by transport methods.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<UploadResponse, ClientError>> + Send + 'a>>;

/// Abstract upload transport.
///
/// The real implementation speaks multipart HTTP; tests drive the
/// uploader against a mock. Using a trait keeps planning and retry
/// logic decoupled from the wire.
pub trait Transport: Send + Sync {
    fn send_whole_file(&self, upload: WholeFileUpload) -> TransportFuture<'_>;

    fn send_chunk(&self, upload: ChunkUpload) -> TransportFuture<'_>;
}

/// HTTP transport against a landrop server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for a server base URL like `http://host:8736`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_upload(&self, form: reqwest::multipart::Form) -> Result<UploadResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        Self::parse_json(resp).await
    }

    /// Parses a JSON body, mapping non-2xx statuses to [`ClientError::Server`]
    /// with the server's `{error}` message when present.
    async fn parse_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let message = resp
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Lists a directory on the server.
    pub async fn list(&self, path: &str) -> Result<Listing, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/files"))
            .query(&[("path", path)])
            .send()
            .await?;
        Self::parse_json(resp).await
    }

    /// Deletes a file or directory on the server.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url("/api/files"))
            .query(&[("path", path)])
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = resp
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Downloads a file's bytes.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/download"))
            .query(&[("path", path)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Fetches server status (storage usage, limits).
    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let resp = self.http.get(self.url("/api/status")).send().await?;
        Self::parse_json(resp).await
    }
}

impl Transport for HttpTransport {
    fn send_whole_file(&self, upload: WholeFileUpload) -> TransportFuture<'_> {
        Box::pin(async move {
            let part = reqwest::multipart::Part::bytes(upload.data).file_name(upload.file_name);
            let form = reqwest::multipart::Form::new()
                .text("path", upload.dest_path)
                .part("files", part);
            self.post_upload(form).await
        })
    }

    fn send_chunk(&self, upload: ChunkUpload) -> TransportFuture<'_> {
        Box::pin(async move {
            let part =
                reqwest::multipart::Part::bytes(upload.data).file_name(upload.file_name.clone());
            let mut form = reqwest::multipart::Form::new()
                .text("path", upload.dest_path)
                .text("chunkIndex", upload.chunk_index.to_string())
                .text("totalChunks", upload.total_chunks.to_string())
                .text("fileName", upload.file_name)
                .text("offset", upload.offset.to_string())
                .text("checksum", upload.checksum)
                .part("files", part);
            if let Some(id) = upload.upload_id {
                form = form.text("uploadId", id);
            }
            self.post_upload(form).await
        })
    }
}

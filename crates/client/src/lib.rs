//! Client-side upload driver.
//!
//! The [`Uploader`] decides whether a file needs chunking, transmits
//! chunks strictly in order with bounded per-chunk retry, and reports
//! progress through an event channel. Transport is behind a trait so the
//! planning and retry logic is testable against a mock.

mod progress;
mod transport;
mod uploader;

pub use progress::{BatchReport, FileProgress, UploadEvent};
pub use transport::{ChunkUpload, HttpTransport, Transport, TransportFuture, WholeFileUpload};
pub use uploader::Uploader;

/// Errors observed by the upload client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("chunk {chunk_index} failed after {attempts} attempts: {source}")]
    ExhaustedRetries {
        chunk_index: u32,
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    #[error("unexpected server response: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] landrop_transfer::TransferError),

    #[error("cancelled")]
    Cancelled,
}

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use landrop_file_ops::FileOpsError;
use landrop_protocol::ErrorResponse;
use landrop_transfer::TransferError;

/// Error surface of every route.
///
/// Every variant maps to a status code and renders as `{"error": "..."}`.
/// Validation failures never touch the filesystem; I/O failures may
/// leave partial temp-file state behind (the reaper's problem).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("malformed multipart request: {0}")]
    Multipart(#[from] MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    FileOps(#[from] FileOpsError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transfer(e) => match e {
                TransferError::InvalidPath(_)
                | TransferError::ChecksumMismatch
                | TransferError::SessionNotFound(_) => StatusCode::BAD_REQUEST,
                TransferError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::FileOps(e) => match e {
                FileOpsError::NotFound(_) => StatusCode::NOT_FOUND,
                FileOpsError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
                FileOpsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "request failed");
        } else {
            tracing::debug!(status = %status, error = %message, "request rejected");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

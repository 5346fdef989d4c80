use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use landrop_protocol::{StatusResponse, size::format_size};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/status`: storage usage and configured limits.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let root = state.root.clone();
    let used_bytes = tokio::task::spawn_blocking(move || landrop_file_ops::storage_usage(&root))
        .await
        .map_err(|e| ApiError::Io(std::io::Error::other(e)))??;

    Ok(Json(StatusResponse {
        name: state.name.clone(),
        used_bytes,
        used_formatted: format_size(used_bytes),
        max_upload_size: state.max_upload_size,
        chunk_size: state.chunk_size,
    }))
}

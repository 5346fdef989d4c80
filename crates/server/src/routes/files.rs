use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use landrop_protocol::{Listing, mime_type_for};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    path: String,
}

/// `GET /api/files?path=`: lists one directory.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Listing>, ApiError> {
    let root = state.root.clone();
    let rel = query.path.trim().trim_matches('/').to_string();
    let listing = tokio::task::spawn_blocking(move || landrop_file_ops::list_directory(&root, &rel))
        .await
        .map_err(|e| ApiError::Io(std::io::Error::other(e)))??;
    Ok(Json(listing))
}

/// `GET /api/download?path=`: streams one file.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let rel = query.path.trim().trim_matches('/').to_string();
    let path = landrop_file_ops::locate_file(&state.root, &rel)?;

    let file = tokio::fs::File::open(&path).await?;
    let size = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".into());

    let body = Body::from_stream(ReaderStream::new(file));
    let response = (
        [
            (header::CONTENT_TYPE, mime_type_for(&file_name).to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response();
    Ok(response)
}

/// `DELETE /api/files?path=`: deletes a file or directory.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let root = state.root.clone();
    let rel = query.path.trim().trim_matches('/').to_string();
    let deleted = rel.clone();
    tokio::task::spawn_blocking(move || landrop_file_ops::delete_entry(&root, &rel))
        .await
        .map_err(|e| ApiError::Io(std::io::Error::other(e)))??;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("deleted {deleted}"),
    })))
}

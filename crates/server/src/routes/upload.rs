use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};

use landrop_protocol::{ChunkMeta, UploadResponse};
use landrop_transfer::{TempStore, validate_file_name};

use crate::error::ApiError;
use crate::state::AppState;

/// Raw multipart fields of one upload request, before validation.
#[derive(Default)]
struct RawUpload {
    file_part: Option<(String, Vec<u8>)>,
    path: String,
    chunk_index: Option<u32>,
    total_chunks: Option<u32>,
    file_name: Option<String>,
    offset: Option<u64>,
    upload_id: Option<String>,
    checksum: String,
}

/// `POST /api/upload`
///
/// One route, two shapes: a request carrying `chunkIndex`,
/// `totalChunks` and `fileName` together is one chunk of a chunked
/// upload; a request carrying none of them is a whole file. Anything in
/// between is malformed.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let raw = collect_fields(multipart).await?;

    state
        .store
        .ensure_layout()
        .map_err(|e| ApiError::StorageUnavailable(e.to_string()))?;

    let chunked_markers = [
        raw.chunk_index.is_some(),
        raw.total_chunks.is_some(),
        raw.file_name.is_some(),
    ];
    if chunked_markers.iter().any(|&m| m) && !chunked_markers.iter().all(|&m| m) {
        return Err(ApiError::Validation(
            "chunkIndex, totalChunks and fileName must be sent together".into(),
        ));
    }

    if raw.chunk_index.is_some() {
        handle_chunk(&state, raw).await.map(Json)
    } else {
        handle_whole_file(&state, raw).await.map(Json)
    }
}

async fn collect_fields(mut multipart: Multipart) -> Result<RawUpload, ApiError> {
    let mut raw = RawUpload::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or("") {
            "files" => {
                let name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                raw.file_part = Some((name, bytes.to_vec()));
            }
            "path" => raw.path = field.text().await?,
            "chunkIndex" => raw.chunk_index = Some(parse_field(field, "chunkIndex").await?),
            "totalChunks" => raw.total_chunks = Some(parse_field(field, "totalChunks").await?),
            "fileName" => raw.file_name = Some(field.text().await?),
            "offset" => raw.offset = Some(parse_field(field, "offset").await?),
            "uploadId" => raw.upload_id = Some(field.text().await?),
            "checksum" => raw.checksum = field.text().await?,
            _ => {}
        }
    }

    Ok(raw)
}

async fn parse_field<T: std::str::FromStr>(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<T, ApiError> {
    let text = field.text().await?;
    text.parse()
        .map_err(|_| ApiError::Validation(format!("invalid {name}: {text}")))
}

async fn handle_whole_file(
    state: &AppState,
    raw: RawUpload,
) -> Result<UploadResponse, ApiError> {
    let (file_name, data) = raw
        .file_part
        .ok_or_else(|| ApiError::Validation("no file part in request".into()))?;
    let file_name = file_name.trim().to_string();
    validate_file_name(&file_name)?;

    let dest_rel = normalize_rel(&raw.path);
    let dest_dir = landrop_transfer::resolve_under_root(&state.root, &dest_rel)?;

    // A whole file is a one-chunk session: same temp accumulation, same
    // collision-safe promotion.
    let store = state.store.clone();
    let name = file_name.clone();
    let rel = dest_rel.clone();
    let record = run_blocking(move || {
        let temp_name = TempStore::temp_name(&name, &TempStore::mint_token());
        store.write_chunk(&temp_name, 0, &data, "", true)?;
        store.finalize(&temp_name, &dest_dir, &rel, &name)
    })
    .await?;

    Ok(UploadResponse::whole_file(record, dest_rel))
}

async fn handle_chunk(state: &AppState, raw: RawUpload) -> Result<UploadResponse, ApiError> {
    let meta = validate_chunk_meta(&raw)?;
    let (_, data) = raw
        .file_part
        .ok_or_else(|| ApiError::Validation("no file part in request".into()))?;

    let dest_rel = normalize_rel(&raw.path);
    let dest_dir = landrop_transfer::resolve_under_root(&state.root, &dest_rel)?;

    let token = match &meta.upload_id {
        Some(token) => token.clone(),
        None => TempStore::mint_token(),
    };
    let temp_name = TempStore::temp_name(&meta.file_name, &token);

    if meta.chunk_index == 0 {
        tracing::info!(
            file = %meta.file_name,
            total_chunks = meta.total_chunks,
            upload_id = %token,
            "chunked upload started"
        );
    }

    let store = state.store.clone();
    let write_meta = meta.clone();
    let rel = dest_rel.clone();
    let record = run_blocking(move || {
        store.write_chunk(
            &temp_name,
            write_meta.offset,
            &data,
            &write_meta.checksum,
            write_meta.chunk_index == 0,
        )?;
        if write_meta.is_last() {
            return Ok(Some(store.finalize(
                &temp_name,
                &dest_dir,
                &rel,
                &write_meta.file_name,
            )?));
        }
        Ok(None)
    })
    .await?;

    match record {
        Some(record) => Ok(UploadResponse::completed(record, dest_rel, token)),
        None => Ok(UploadResponse::chunk_ack(
            meta.chunk_index,
            meta.total_chunks,
            token,
        )),
    }
}

fn validate_chunk_meta(raw: &RawUpload) -> Result<ChunkMeta, ApiError> {
    let chunk_index = raw.chunk_index.unwrap_or_default();
    let total_chunks = raw.total_chunks.unwrap_or_default();
    let file_name = raw.file_name.clone().unwrap_or_default().trim().to_string();

    if total_chunks == 0 {
        return Err(ApiError::Validation("totalChunks must be positive".into()));
    }
    if chunk_index >= total_chunks {
        return Err(ApiError::Validation(format!(
            "chunkIndex {chunk_index} out of range (totalChunks {total_chunks})"
        )));
    }
    validate_file_name(&file_name)?;

    let offset = raw
        .offset
        .ok_or_else(|| ApiError::Validation("offset is required for chunked uploads".into()))?;
    if (offset == 0) != (chunk_index == 0) {
        return Err(ApiError::Validation(
            "offset must be 0 exactly for chunk 0".into(),
        ));
    }

    let upload_id = match (&raw.upload_id, chunk_index) {
        (None, 0) => None,
        (None, _) => {
            return Err(ApiError::Validation(
                "uploadId is required after chunk 0".into(),
            ));
        }
        (Some(_), 0) => {
            return Err(ApiError::Validation(
                "uploadId must not be sent on chunk 0".into(),
            ));
        }
        (Some(id), _) => {
            // The token lands in a file name; anything outside the
            // alphabet the server mints is hostile.
            if id.is_empty() || id.len() > 64 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ApiError::Validation("malformed uploadId".into()));
            }
            Some(id.clone())
        }
    };

    Ok(ChunkMeta {
        chunk_index,
        total_chunks,
        file_name,
        offset,
        upload_id,
        checksum: raw.checksum.clone(),
    })
}

/// Destination path with surrounding slashes and whitespace stripped.
fn normalize_rel(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, landrop_transfer::TransferError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Io(std::io::Error::other(e)))?
        .map_err(ApiError::from)
}

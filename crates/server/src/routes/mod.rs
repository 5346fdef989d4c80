mod files;
mod status;
mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the API router.
///
/// The body limit tracks the configured chunk size: a well-behaved
/// client never sends more than one chunk (or one sub-threshold whole
/// file) per request, plus multipart framing.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = (state.chunk_size as usize).saturating_mul(2);

    Router::new()
        .route("/api/upload", post(upload::upload))
        .route("/api/files", get(files::list).delete(files::remove))
        .route("/api/download", get(files::download))
        .route("/api/status", get(status::status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

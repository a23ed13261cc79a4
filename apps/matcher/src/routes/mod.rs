pub mod documents;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::ingest::MAX_FILE_BYTES;
use crate::state::AppState;

/// Headroom above the file limit for multipart framing, so oversize files
/// reach ingest and get a validation error instead of a bare 413.
const BODY_LIMIT: usize = MAX_FILE_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(documents::handle_upload_resume))
        .route("/api/v1/jobs", post(documents::handle_upload_job))
        .route(
            "/api/v1/documents/:doc_id",
            get(documents::handle_get_document),
        )
        .route("/api/v1/matches/:doc_id", get(documents::handle_get_matches))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

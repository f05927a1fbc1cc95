use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use latecast_store::StoreError;

use crate::app::AppState;

type HandlerError = (StatusCode, Json<Value>);

/// GET /api/videos — all records in creation order.
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, HandlerError> {
    let videos = state.store.list_all().map_err(internal)?;
    Ok(Json(json!({"success": true, "videos": videos})))
}

/// DELETE /api/videos/{id} — only while the record is still pending.
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let video = state.store.delete(&id).map_err(|e| match e {
        StoreError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": e.to_string()})),
        ),
        StoreError::InvalidState { .. } => (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "error": e.to_string()})),
        ),
        StoreError::Database(_) => internal(e),
    })?;

    // Best-effort artifact cleanup; the record is already gone.
    if let Err(e) = tokio::fs::remove_file(&video.source_path).await {
        warn!(path = %video.source_path, error = %e, "could not remove stored artifact");
    }

    info!(video_id = %id, "video deleted");
    Ok(Json(json!({"success": true})))
}

fn internal(e: impl std::fmt::Display) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "error": e.to_string()})),
    )
}

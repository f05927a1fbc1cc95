//! Upload intake — POST /api/upload.
//!
//! Accepts a multipart form with a `video` file part and a `scheduled_time`
//! field (RFC3339 with offset). The artifact is stored on disk and a pending
//! record is inserted; publication happens later, driven by the scheduler.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use latecast_store::NewVideo;

use crate::app::AppState;
use crate::metadata::derive_metadata;

type HandlerError = (StatusCode, Json<Value>);

/// POST /api/upload
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, HandlerError> {
    let mut file: Option<(String, axum::body::Bytes)> = None;
    let mut scheduled_raw: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "video" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "upload.bin".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("cannot read video part: {e}")))?;
                file = Some((filename, data));
            }
            "scheduled_time" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(&format!("cannot read scheduled_time: {e}")))?;
                scheduled_raw = Some(text);
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| bad_request("no video file provided"))?;
    let scheduled_raw = scheduled_raw.ok_or_else(|| bad_request("no scheduled time provided"))?;

    // Absolute instant only — a local time without offset is ambiguous.
    let scheduled_at: DateTime<Utc> = DateTime::parse_from_rfc3339(scheduled_raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| bad_request(&format!("invalid scheduled_time (need RFC3339): {e}")))?;

    let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&filename));
    let dest = Path::new(&state.config.storage.upload_dir).join(&stored_name);

    tokio::fs::create_dir_all(&state.config.storage.upload_dir)
        .await
        .map_err(internal)?;
    tokio::fs::write(&dest, &data).await.map_err(internal)?;

    let meta = derive_metadata(&filename);
    let video = state
        .store
        .insert(NewVideo {
            source_path: dest.to_string_lossy().into_owned(),
            title: meta.title,
            description: meta.description,
            scheduled_at,
        })
        .map_err(internal)?;

    info!(
        video_id = %video.id,
        scheduled_at = %scheduled_at,
        bytes = data.len(),
        "video scheduled"
    );

    Ok(Json(json!({
        "success": true,
        "video_id": video.id,
        "message": "video scheduled successfully",
    })))
}

/// Keep the stored name flat: strip any path components the client sent.
fn sanitize_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string()
}

fn bad_request(message: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message})),
    )
}

fn internal(e: impl std::fmt::Display) -> HandlerError {
    warn!("upload failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "error": e.to_string()})),
    )
}

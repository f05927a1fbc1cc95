use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;

/// GET /api/cron — manual publish trigger.
///
/// Same contract as the periodic loop: idempotent, safe to race other
/// invocations. The claim step inside the engine keeps overlapping cycles
/// from uploading the same record twice.
pub async fn cron_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("cron trigger received");
    match state.engine.run_cycle().await {
        Ok(summary) => Ok(Json(json!({"success": true, "summary": summary}))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": e.to_string()})),
        )),
    }
}

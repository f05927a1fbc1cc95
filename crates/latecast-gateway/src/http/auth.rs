//! YouTube OAuth endpoints: consent redirect, callback, status probe.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;

/// GET /api/youtube/auth — send the operator to Google's consent page.
pub async fn auth_redirect_handler(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.auth.authorize_url())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// GET /api/youtube/callback?code=… — exchange the code, persist tokens.
pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let code = query.code.ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": "no authorization code provided"})),
    ))?;

    state.auth.exchange_code(&code).await.map_err(|e| {
        warn!(error = %e, "OAuth code exchange failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": e.to_string()})),
        )
    })?;

    Ok(Redirect::temporary("/"))
}

/// GET /api/youtube/status — whether a token set is on file.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "authenticated": state.auth.is_authorized().await,
    }))
}

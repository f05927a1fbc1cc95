use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use latecast_core::LatecastConfig;
use latecast_scheduler::SchedulerEngine;
use latecast_store::VideoStore;
use latecast_youtube::YouTubeAuth;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: LatecastConfig,
    pub store: Arc<VideoStore>,
    pub auth: Arc<YouTubeAuth>,
    pub engine: Arc<SchedulerEngine>,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.storage.max_upload_bytes;
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/api/upload", post(crate::http::upload::upload_handler))
        .route("/api/videos", get(crate::http::videos::list_handler))
        .route(
            "/api/videos/{id}",
            delete(crate::http::videos::delete_handler),
        )
        .route("/api/cron", get(crate::http::cron::cron_handler))
        .route(
            "/api/youtube/auth",
            get(crate::http::auth::auth_redirect_handler),
        )
        .route(
            "/api/youtube/callback",
            get(crate::http::auth::callback_handler),
        )
        .route(
            "/api/youtube/status",
            get(crate::http::auth::status_handler),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

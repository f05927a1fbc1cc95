use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use latecast_core::LatecastConfig;
use latecast_scheduler::{CredentialProvider, SchedulerEngine};
use latecast_store::VideoStore;
use latecast_youtube::{YouTubeAuth, YouTubeUploader};

mod app;
mod http;
mod metadata;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "latecast_gateway=info,latecast_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: explicit path > LATECAST_CONFIG env > ~/.latecast/latecast.toml
    let config_path = std::env::var("LATECAST_CONFIG").ok();
    let config = LatecastConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        LatecastConfig::default()
    });

    ensure_parent_dir(&config.database.path);
    std::fs::create_dir_all(&config.storage.upload_dir)?;

    info!(path = %config.database.path, "opening SQLite database");
    let conn = rusqlite::Connection::open(&config.database.path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    let store = Arc::new(VideoStore::new(conn)?);

    let auth = Arc::new(YouTubeAuth::new(&config.youtube));
    let uploader = Arc::new(YouTubeUploader::new(config.youtube.privacy.clone()));
    let engine = Arc::new(SchedulerEngine::new(
        Arc::clone(&store),
        Arc::clone(&auth) as Arc<dyn CredentialProvider>,
        uploader,
        Duration::from_secs(config.scheduler.publish_timeout_secs),
    ));

    // background publish loop, stopped through the watch channel on shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poll_interval = Duration::from_secs(config.scheduler.poll_secs);
    let engine_loop = tokio::spawn(Arc::clone(&engine).run(poll_interval, shutdown_rx));

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let state = Arc::new(app::AppState {
        config,
        store,
        auth,
        engine,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!(%addr, "latecast gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = engine_loop.await;
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
}

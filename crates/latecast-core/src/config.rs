use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Top-level config (latecast.toml + LATECAST_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatecastConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for LatecastConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            youtube: YouTubeConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl LatecastConfig {
    /// Load config: explicit path > LATECAST_CONFIG env > ~/.latecast/latecast.toml.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: LatecastConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("LATECAST_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where uploaded artifacts are kept until publication.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Hard cap on a single upload request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Google OAuth client settings plus upload behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Where exchanged/refreshed OAuth tokens are persisted as JSON.
    #[serde(default = "default_tokens_path")]
    pub tokens_path: String,
    /// privacyStatus applied to every upload: public, unlisted or private.
    #[serde(default = "default_privacy")]
    pub privacy: String,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            tokens_path: default_tokens_path(),
            privacy: default_privacy(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between publish cycles of the background loop.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    /// Wall-clock budget for a single publish attempt.
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_secs: default_poll_secs(),
            publish_timeout_secs: default_publish_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_config_path() -> String {
    format!("{}/latecast.toml", data_dir())
}

fn default_db_path() -> String {
    format!("{}/latecast.db", data_dir())
}

fn default_upload_dir() -> String {
    format!("{}/uploads", data_dir())
}

fn default_tokens_path() -> String {
    format!("{}/youtube-tokens.json", data_dir())
}

fn default_redirect_uri() -> String {
    format!("http://localhost:{DEFAULT_PORT}/api/youtube/callback")
}

fn default_privacy() -> String {
    "private".to_string()
}

fn default_max_upload_bytes() -> usize {
    512 * 1024 * 1024 // 512 MB
}

fn default_poll_secs() -> u64 {
    30
}

fn default_publish_timeout_secs() -> u64 {
    300
}

fn data_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.latecast")
}

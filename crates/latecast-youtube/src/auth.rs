use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use latecast_core::config::YouTubeConfig;
use latecast_scheduler::{CredentialProvider, PublishError};

use crate::error::{Result, YouTubeError};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_MS: i64 = 60_000;

/// OAuth credentials persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix millis after which `access_token` is stale.
    pub expiry_millis: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Google OAuth client: consent URL, code exchange, token refresh.
pub struct YouTubeAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    tokens_path: String,
    tokens: RwLock<Option<StoredTokens>>,
}

impl YouTubeAuth {
    /// Build the client, loading previously persisted tokens if present.
    pub fn new(config: &YouTubeConfig) -> Self {
        let tokens = match std::fs::read_to_string(&config.tokens_path) {
            Ok(data) => match serde_json::from_str::<StoredTokens>(&data) {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    warn!(path = %config.tokens_path, error = %e, "ignoring malformed token file");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            tokens_path: config.tokens_path.clone(),
            tokens: RwLock::new(tokens),
        }
    }

    /// Google consent page URL for the upload scope.
    ///
    /// `access_type=offline` + `prompt=consent` so Google returns a
    /// refresh_token and not just a short-lived access token.
    pub fn authorize_url(&self) -> String {
        format!(
            "{GOOGLE_AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(UPLOAD_SCOPE),
        )
    }

    /// Whether a token set is available (not necessarily still valid).
    pub async fn is_authorized(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Exchange an authorization code for tokens and persist them.
    pub async fn exchange_code(&self, code: &str) -> Result<()> {
        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Token(format!("code exchange failed: {text}")));
        }

        let grant: TokenResponse = response.json().await?;
        let refresh_token = grant.refresh_token.ok_or_else(|| {
            YouTubeError::Token("no refresh_token in grant response".to_string())
        })?;
        let stored = StoredTokens {
            access_token: grant.access_token,
            refresh_token,
            token_type: grant.token_type,
            expiry_millis: chrono::Utc::now().timestamp_millis() + grant.expires_in * 1000,
        };

        self.persist(&stored);
        let mut tokens = self.tokens.write().await;
        *tokens = Some(stored);
        info!("YouTube authorization complete");
        Ok(())
    }

    /// Ensure we have a valid access token. Refresh if expired.
    pub async fn ensure_token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp_millis();

        // Fast path — read lock
        {
            let tokens = self.tokens.read().await;
            match tokens.as_ref() {
                Some(t) if now + EXPIRY_MARGIN_MS < t.expiry_millis => {
                    return Ok(t.access_token.clone())
                }
                Some(_) => {}
                None => return Err(YouTubeError::NotAuthorized),
            }
        }

        // Slow path — write lock, refresh
        let mut tokens = self.tokens.write().await;
        let current = tokens.as_ref().ok_or(YouTubeError::NotAuthorized)?;
        let now = chrono::Utc::now().timestamp_millis();
        if now + EXPIRY_MARGIN_MS < current.expiry_millis {
            return Ok(current.access_token.clone());
        }

        info!("refreshing YouTube access token");
        let refreshed = self.refresh(current).await?;
        let access_token = refreshed.access_token.clone();
        self.persist(&refreshed);
        *tokens = Some(refreshed);

        Ok(access_token)
    }

    async fn refresh(&self, current: &StoredTokens) -> Result<StoredTokens> {
        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Token(format!("token refresh failed: {text}")));
        }

        let grant: TokenResponse = response.json().await?;
        debug!(expires_in = grant.expires_in, "YouTube token refreshed");

        Ok(StoredTokens {
            access_token: grant.access_token,
            // Google omits refresh_token on refresh grants — keep the old one.
            refresh_token: grant
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            token_type: grant.token_type,
            expiry_millis: chrono::Utc::now().timestamp_millis() + grant.expires_in * 1000,
        })
    }

    fn persist(&self, tokens: &StoredTokens) {
        match serde_json::to_string_pretty(tokens) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.tokens_path, json) {
                    warn!(path = %self.tokens_path, error = %e, "failed to save YouTube tokens");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialise YouTube tokens"),
        }
    }
}

#[async_trait]
impl CredentialProvider for YouTubeAuth {
    async fn access_token(&self) -> std::result::Result<String, PublishError> {
        self.ensure_token()
            .await
            .map_err(|e| PublishError::Unauthorized(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Seconds until expiry.
    expires_in: i64,
    #[serde(default = "default_token_type")]
    token_type: String,
}

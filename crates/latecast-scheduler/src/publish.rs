use async_trait::async_trait;

use crate::error::PublishError;

/// Everything the platform needs to publish one artifact.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub source_path: String,
    pub title: String,
    pub description: String,
}

/// Supplies a valid platform access token, refreshing as needed.
///
/// Tokens are requested fresh per attempt rather than cached by the engine,
/// so concurrent cycles never observe a stale credential.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, PublishError>;
}

/// Opaque fallible upload call against the platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload the artifact; returns the platform-assigned ID on success.
    async fn publish(&self, request: &PublishRequest, token: &str)
        -> Result<String, PublishError>;
}

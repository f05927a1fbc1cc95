use thiserror::Error;

/// Errors from the OAuth flow and token storage.
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// No tokens on disk — the operator has never completed the consent flow.
    #[error("not authorized: no stored tokens, visit /api/youtube/auth first")]
    NotAuthorized,

    /// Google's token endpoint rejected the request.
    #[error("token endpoint error: {0}")]
    Token(String),

    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading or writing the token file failed.
    #[error("token storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, YouTubeError>;

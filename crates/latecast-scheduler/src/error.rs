use thiserror::Error;

/// Ways a single publish attempt can fail.
///
/// Every variant ends the record in `failed` with the rendered message as
/// `last_error`; none of them is retried automatically.
#[derive(Debug, Error)]
pub enum PublishError {
    /// No valid platform credential and refresh was not possible.
    #[error("not authorized with the platform: {0}")]
    Unauthorized(String),

    /// The platform refused the upload (quota, invalid metadata, …).
    #[error("platform rejected the upload: {0}")]
    Rejected(String),

    /// The artifact no longer exists at its stored path.
    #[error("source file missing: {0}")]
    SourceMissing(String),

    /// Transport-level failure talking to the platform.
    #[error("network error: {0}")]
    Network(String),

    /// The attempt exceeded its wall-clock budget.
    #[error("publish attempt timed out after {secs}s")]
    Timeout { secs: u64 },
}

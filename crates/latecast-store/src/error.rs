use thiserror::Error;

use crate::types::VideoStatus;

/// Errors that can occur during video store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No video with the given ID exists in the store.
    #[error("video not found: {id}")]
    NotFound { id: String },

    /// The operation is not valid for the video's current status
    /// (e.g. deleting a record that is no longer pending).
    #[error("video {id} is {status}, operation not permitted")]
    InvalidState { id: String, status: VideoStatus },

    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

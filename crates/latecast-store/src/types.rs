use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a scheduled video.
///
/// `pending → publishing → {completed, failed}`. The two terminal states are
/// never left automatically; a failed upload needs manual resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Waiting for its scheduled_at time.
    Pending,
    /// Claimed by a publish cycle; the upload is in flight.
    Publishing,
    /// Uploaded successfully; `published_ref` holds the platform ID.
    Completed,
    /// The publish attempt failed; `last_error` holds the cause.
    Failed,
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Publishing => "publishing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VideoStatus::Pending),
            "publishing" => Ok(VideoStatus::Publishing),
            "completed" => Ok(VideoStatus::Completed),
            "failed" => Ok(VideoStatus::Failed),
            other => Err(format!("unknown video status: {other}")),
        }
    }
}

/// A persisted scheduling record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// UUID v4 string — primary key, never reused.
    pub id: String,
    /// Path of the stored artifact on local disk.
    pub source_path: String,
    /// Title attached at intake; immutable after creation.
    pub title: String,
    /// Description attached at intake; immutable after creation.
    pub description: String,
    /// Current lifecycle state.
    pub status: VideoStatus,
    /// UTC instant at which publication should be attempted.
    pub scheduled_at: DateTime<Utc>,
    /// Platform-assigned video ID, present once `Completed`.
    pub published_ref: Option<String>,
    /// Cause of the failed publish attempt, present once `Failed`.
    pub last_error: Option<String>,
    /// ISO-8601 timestamp of record creation.
    pub created_at: String,
    /// ISO-8601 timestamp of the last status change.
    pub updated_at: String,
}

/// Intake parameters for a new record; everything else is store-assigned.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub source_path: String,
    pub title: String,
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
}

//! `latecast-youtube` — YouTube Data API adapter.
//!
//! Auth flow:
//!   1. GET /api/youtube/auth redirects the operator to Google's consent page.
//!   2. The callback exchanges the authorization code and persists tokens
//!      (access + refresh) as JSON on disk.
//!   3. Before each upload the provider checks expiry and refreshes with the
//!      refresh_token, re-persisting the result.
//!
//! Uploads go through the multipart variant of the Data API videos.insert
//! endpoint: one JSON metadata part, one media part.

pub mod auth;
pub mod error;
pub mod upload;

pub use auth::{StoredTokens, YouTubeAuth};
pub use error::{Result, YouTubeError};
pub use upload::YouTubeUploader;

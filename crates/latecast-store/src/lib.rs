//! `latecast-store` — SQLite-backed store for scheduled video records.
//!
//! One row per submitted artifact. Rows are created `pending` by the upload
//! intake and mutated exclusively by the publish engine afterwards, except
//! for deletion, which is only permitted while a row is still `pending`.
//!
//! The claim step ([`VideoStore::claim`]) is the concurrency-critical piece:
//! a single conditional UPDATE whose WHERE clause re-checks the status, so
//! two racing publish cycles can never both own the same record.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::VideoStore;
pub use types::{NewVideo, Video, VideoStatus};

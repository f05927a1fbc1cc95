use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{NewVideo, Video, VideoStatus};

const SELECT_COLUMNS: &str = "id, source_path, title, description, status,
       scheduled_at, published_ref, last_error, created_at, updated_at";

/// Thread-safe store for scheduled video records.
///
/// Wraps a single SQLite connection in a `Mutex`. Status mutations never rely
/// on the mutex for correctness: every state change is a conditional UPDATE
/// whose WHERE clause re-checks the current status, so the store stays safe
/// even when a second connection to the same database file is in play.
pub struct VideoStore {
    db: Mutex<Connection>,
}

impl VideoStore {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Insert a new record with status `pending`. Returns the stored row.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub fn insert(&self, new: NewVideo) -> Result<Video> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let scheduled = new.scheduled_at.to_rfc3339();

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO videos
             (id, source_path, title, description, status, scheduled_at,
              published_ref, last_error, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5, NULL, NULL, ?6, ?6)",
            rusqlite::params![id, new.source_path, new.title, new.description, scheduled, now],
        )?;
        debug!(video_id = %id, "video record inserted");

        Ok(Video {
            id,
            source_path: new.source_path,
            title: new.title,
            description: new.description,
            status: VideoStatus::Pending,
            scheduled_at: new.scheduled_at,
            published_ref: None,
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Fetch a single record by ID.
    pub fn get(&self, id: &str) -> Result<Video> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM videos WHERE id = ?1"),
            [id],
            row_to_video,
        ) {
            Ok(video) => Ok(video),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound {
                id: id.to_string(),
            }),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Return all records in creation order.
    pub fn list_all(&self) -> Result<Vec<Video>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM videos ORDER BY created_at"
        ))?;
        let videos = stmt
            .query_map([], row_to_video)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    /// Return every pending record whose scheduled time has arrived.
    pub fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Video>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM videos
             WHERE status = 'pending' AND scheduled_at <= ?1
             ORDER BY scheduled_at"
        ))?;
        let videos = stmt
            .query_map([now.to_rfc3339()], row_to_video)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    /// Atomically move a pending record into `publishing`.
    ///
    /// Returns `false` when no row changed, i.e. a concurrent cycle already
    /// claimed the record (or it no longer exists). The status check lives in
    /// the WHERE clause of a single UPDATE; callers must never pre-read the
    /// status and update unconditionally.
    #[instrument(skip(self))]
    pub fn claim(&self, id: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE videos SET status = 'publishing', updated_at = ?1
             WHERE id = ?2 AND status = 'pending'",
            rusqlite::params![now, id],
        )?;
        Ok(n == 1)
    }

    /// Move a claimed record to `completed`, storing the platform ID.
    #[instrument(skip(self))]
    pub fn complete(&self, id: &str, published_ref: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE videos
             SET status = 'completed', published_ref = ?1, last_error = NULL, updated_at = ?2
             WHERE id = ?3 AND status = 'publishing'",
            rusqlite::params![published_ref, now, id],
        )?;
        if n == 0 {
            return Err(stale_row(&db, id)?);
        }
        Ok(())
    }

    /// Move a claimed record to `failed`, storing the failure cause.
    #[instrument(skip(self, cause))]
    pub fn fail(&self, id: &str, cause: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE videos
             SET status = 'failed', last_error = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'publishing'",
            rusqlite::params![cause, now, id],
        )?;
        if n == 0 {
            return Err(stale_row(&db, id)?);
        }
        Ok(())
    }

    /// Delete a record, permitted only while it is still `pending`.
    ///
    /// Returns the deleted row so the caller can clean up the stored artifact.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<Video> {
        let db = self.db.lock().unwrap();
        let video = match db.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM videos WHERE id = ?1"),
            [id],
            row_to_video,
        ) {
            Ok(v) => v,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(StoreError::NotFound { id: id.to_string() })
            }
            Err(e) => return Err(StoreError::Database(e)),
        };
        let n = db.execute(
            "DELETE FROM videos WHERE id = ?1 AND status = 'pending'",
            [id],
        )?;
        if n == 0 {
            return Err(StoreError::InvalidState {
                id: id.to_string(),
                status: video.status,
            });
        }
        debug!(video_id = %id, "video record deleted");
        Ok(video)
    }
}

/// Explain why a conditional terminal update touched zero rows.
fn stale_row(db: &Connection, id: &str) -> Result<StoreError> {
    match db.query_row("SELECT status FROM videos WHERE id = ?1", [id], |row| {
        row.get::<_, String>(0)
    }) {
        Ok(raw) => {
            let status = raw.parse::<VideoStatus>().map_err(|e| {
                StoreError::Database(rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    e.into(),
                ))
            })?;
            Ok(StoreError::InvalidState {
                id: id.to_string(),
                status,
            })
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(StoreError::NotFound {
            id: id.to_string(),
        }),
        Err(e) => Err(StoreError::Database(e)),
    }
}

/// Map a SQLite row (SELECT_COLUMNS order) to a `Video`.
fn row_to_video(row: &rusqlite::Row<'_>) -> rusqlite::Result<Video> {
    let status_raw: String = row.get(4)?;
    let status = status_raw.parse::<VideoStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;

    let scheduled_raw: String = row.get(5)?;
    let scheduled_at = DateTime::parse_from_rfc3339(&scheduled_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

    Ok(Video {
        id: row.get(0)?,
        source_path: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status,
        scheduled_at,
        published_ref: row.get(6)?,
        last_error: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> VideoStore {
        VideoStore::new(Connection::open_in_memory().expect("open")).expect("init")
    }

    fn sample(minutes_from_now: i64) -> NewVideo {
        NewVideo {
            source_path: "/tmp/clip.mp4".to_string(),
            title: "Clip".to_string(),
            description: "A clip".to_string(),
            scheduled_at: Utc::now() + Duration::minutes(minutes_from_now),
        }
    }

    #[test]
    fn insert_then_get_roundtrip() {
        let store = store();
        let inserted = store.insert(sample(5)).unwrap();
        let fetched = store.get(&inserted.id).unwrap();
        assert_eq!(fetched.id, inserted.id);
        assert_eq!(fetched.status, VideoStatus::Pending);
        assert_eq!(fetched.title, "Clip");
        assert!(fetched.published_ref.is_none());
        assert!(fetched.last_error.is_none());
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let store = store();
        assert!(matches!(
            store.get("nope"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_all_preserves_creation_order() {
        let store = store();
        let a = store.insert(sample(1)).unwrap();
        let b = store.insert(sample(2)).unwrap();
        let ids: Vec<String> = store.list_all().unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn list_due_skips_future_and_non_pending() {
        let store = store();
        let due = store.insert(sample(-5)).unwrap();
        let _future = store.insert(sample(60)).unwrap();
        let claimed = store.insert(sample(-5)).unwrap();
        assert!(store.claim(&claimed.id).unwrap());

        let ids: Vec<String> = store
            .list_due(Utc::now())
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![due.id]);
    }

    #[test]
    fn claim_succeeds_once() {
        let store = store();
        let video = store.insert(sample(-1)).unwrap();
        assert!(store.claim(&video.id).unwrap());
        // second claim loses the race
        assert!(!store.claim(&video.id).unwrap());
        assert_eq!(store.get(&video.id).unwrap().status, VideoStatus::Publishing);
    }

    #[test]
    fn claim_unknown_id_is_false() {
        let store = store();
        assert!(!store.claim("nope").unwrap());
    }

    #[test]
    fn complete_sets_published_ref() {
        let store = store();
        let video = store.insert(sample(-1)).unwrap();
        store.claim(&video.id).unwrap();
        store.complete(&video.id, "yt-123").unwrap();

        let done = store.get(&video.id).unwrap();
        assert_eq!(done.status, VideoStatus::Completed);
        assert_eq!(done.published_ref.as_deref(), Some("yt-123"));
        assert!(done.last_error.is_none());
    }

    #[test]
    fn fail_sets_last_error() {
        let store = store();
        let video = store.insert(sample(-1)).unwrap();
        store.claim(&video.id).unwrap();
        store.fail(&video.id, "platform rejected the upload").unwrap();

        let failed = store.get(&video.id).unwrap();
        assert_eq!(failed.status, VideoStatus::Failed);
        assert_eq!(
            failed.last_error.as_deref(),
            Some("platform rejected the upload")
        );
        assert!(failed.published_ref.is_none());
    }

    #[test]
    fn terminal_records_reject_further_transitions() {
        let store = store();
        let video = store.insert(sample(-1)).unwrap();
        store.claim(&video.id).unwrap();
        store.complete(&video.id, "yt-123").unwrap();

        assert!(matches!(
            store.complete(&video.id, "yt-456"),
            Err(StoreError::InvalidState { .. })
        ));
        assert!(matches!(
            store.fail(&video.id, "late failure"),
            Err(StoreError::InvalidState { .. })
        ));
        assert_eq!(
            store.get(&video.id).unwrap().published_ref.as_deref(),
            Some("yt-123")
        );
    }

    #[test]
    fn complete_without_claim_is_invalid() {
        let store = store();
        let video = store.insert(sample(-1)).unwrap();
        assert!(matches!(
            store.complete(&video.id, "yt-123"),
            Err(StoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn delete_pending_removes_row() {
        let store = store();
        let video = store.insert(sample(5)).unwrap();
        store.delete(&video.id).unwrap();
        assert!(store.list_all().unwrap().is_empty());
        assert!(matches!(
            store.get(&video.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_non_pending_is_invalid_state() {
        let store = store();
        let video = store.insert(sample(-1)).unwrap();
        store.claim(&video.id).unwrap();
        assert!(matches!(
            store.delete(&video.id),
            Err(StoreError::InvalidState {
                status: VideoStatus::Publishing,
                ..
            })
        ));

        store.fail(&video.id, "boom").unwrap();
        assert!(matches!(
            store.delete(&video.id),
            Err(StoreError::InvalidState {
                status: VideoStatus::Failed,
                ..
            })
        ));
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let store = store();
        assert!(matches!(
            store.delete("nope"),
            Err(StoreError::NotFound { .. })
        ));
    }
}

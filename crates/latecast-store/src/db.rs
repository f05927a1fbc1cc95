use rusqlite::Connection;

use crate::error::Result;

/// Initialise the video schema in `conn`.
///
/// Creates the `videos` table (idempotent) and an index on
/// `(status, scheduled_at)` so the due query stays cheap as terminal rows
/// accumulate.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS videos (
            id            TEXT NOT NULL PRIMARY KEY,
            source_path   TEXT NOT NULL,
            title         TEXT NOT NULL,
            description   TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'pending',
            scheduled_at  TEXT NOT NULL,   -- ISO-8601 UTC
            published_ref TEXT,            -- set only when completed
            last_error    TEXT,            -- set only when failed
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        ) STRICT;

        -- Efficient polling: SELECT … WHERE status = 'pending' AND scheduled_at <= ?
        CREATE INDEX IF NOT EXISTS idx_videos_due ON videos (status, scheduled_at);
        ",
    )?;
    Ok(())
}

use rusqlite::Connection;

use crate::error::Result;

/// Schema statements, applied in order. Each is idempotent and runs as its own
/// statement so the same list works over the D1 HTTP API.
pub const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL,
        created_at  INTEGER NOT NULL DEFAULT (unixepoch()),
        updated_at  INTEGER
    )",
    // Age-based cleanup filters on created_at.
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at)",
];

/// Initialise the posts schema in `conn`. Safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    for stmt in MIGRATIONS {
        conn.execute_batch(stmt)?;
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use posts_core::config::Backend;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::store::RecordStore;
use crate::value::{value_ref_to_json, Row, SqlValue};

/// Where a `DATABASE_URL` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalLocation {
    Memory,
    File(PathBuf),
}

/// Parse `DATABASE_URL`. Accepts `file:<path>`, `file://<path>`, a bare path,
/// or `:memory:`. Network schemes are rejected.
pub fn resolve_location(url: &str) -> Result<LocalLocation> {
    let url = url.trim();
    if url.is_empty() {
        return Err(StoreError::Unavailable("DATABASE_URL is empty".into()));
    }
    let rest = url
        .strip_prefix("file://")
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);
    if rest == ":memory:" {
        return Ok(LocalLocation::Memory);
    }
    if rest.contains("://") {
        return Err(StoreError::Unavailable(format!(
            "unsupported DATABASE_URL for the local store: {url}"
        )));
    }
    Ok(LocalLocation::File(PathBuf::from(rest)))
}

/// File-backed SQLite store.
///
/// One connection per process, guarded by a Mutex; statements are short so
/// the lock is never held across an await point.
pub struct LocalStore {
    db: Mutex<Connection>,
}

impl LocalStore {
    /// Open (creating if needed) the database named by `url` and apply the schema.
    pub fn open(url: &str) -> Result<Self> {
        let location = resolve_location(url)?;
        let conn = match &location {
            LocalLocation::Memory => Connection::open_in_memory()?,
            LocalLocation::File(path) => {
                ensure_parent_dir(path);
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode=WAL;")?;
                conn
            }
        };
        init_db(&conn)?;
        info!(location = ?location, "local store opened");
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| StoreError::Unavailable("local connection lock poisoned".into()))
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    async fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let db = self.conn()?;
        let mut stmt = db.prepare_cached(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Row::new();
            for (i, name) in columns.iter().enumerate() {
                map.insert(name.clone(), value_ref_to_json(row.get_ref(i)?));
            }
            out.push(map);
        }
        debug!(rows = out.len(), "local fetch_all");
        Ok(out)
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let db = self.conn()?;
        let n = db.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(n as u64)
    }
}

/// Ensure the parent directory for a database file exists.
fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

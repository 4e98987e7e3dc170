use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use posts_core::types::Post;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::store::RecordStore;
use crate::value::Row;

const POST_COLUMNS: &str =
    r#"id, name, created_at AS "createdAt", updated_at AS "updatedAt""#;

/// Typed access to the `posts` table over any [`RecordStore`].
///
/// Holds no cached rows: every call is a single statement against the store.
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn RecordStore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Every post, in the store's native order.
    #[instrument(skip(self), fields(backend = %self.store.backend()))]
    pub async fn list_all(&self) -> Result<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts");
        let rows = self.store.fetch_all(&sql, &[]).await?;
        debug!(count = rows.len(), "posts listed");
        rows.into_iter().map(row_to_post).collect()
    }

    /// Insert a post and return it as stored (id and created_at assigned by
    /// the store). One round trip via `INSERT … RETURNING`.
    #[instrument(skip(self), fields(backend = %self.store.backend()))]
    pub async fn create(&self, name: &str) -> Result<Post> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }

        let sql = format!("INSERT INTO posts (name) VALUES (?1) RETURNING {POST_COLUMNS}");
        let row = self
            .store
            .fetch_all(&sql, &[name.into()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".into()))?;

        let post = row_to_post(row)?;
        info!(id = post.id, "post created");
        Ok(post)
    }

    /// Delete every post created strictly before `threshold_secs` (Unix seconds).
    /// Returns the number of rows removed.
    #[instrument(skip(self), fields(backend = %self.store.backend()))]
    pub async fn delete_older_than(&self, threshold_secs: i64) -> Result<u64> {
        let n = self
            .store
            .execute(
                "DELETE FROM posts WHERE created_at < ?1",
                &[threshold_secs.into()],
            )
            .await?;
        info!(deleted = n, threshold_secs, "old posts cleaned up");
        Ok(n)
    }

    /// Delete posts older than a retention window measured back from `now`.
    pub async fn delete_older_than_days(&self, days: u32, now: DateTime<Utc>) -> Result<u64> {
        let threshold = now - Duration::days(i64::from(days));
        self.delete_older_than(threshold.timestamp()).await
    }
}

fn row_to_post(row: Row) -> Result<Post> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode(e.to_string()))
}

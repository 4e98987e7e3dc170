use async_trait::async_trait;
use posts_core::config::Backend;

use crate::error::Result;
use crate::value::{Row, SqlValue};

/// Statement-level query interface shared by every backend.
///
/// Callers hold `Arc<dyn RecordStore>` and never learn which backend answers.
/// Each call is one round trip; there are no multi-statement transactions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Which backend this handle talks to (logging and health output only).
    fn backend(&self) -> Backend;

    /// Run a statement that returns rows (`SELECT`, `INSERT … RETURNING`).
    async fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Run a statement and return the number of rows it changed.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;
}

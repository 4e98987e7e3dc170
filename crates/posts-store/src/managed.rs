//! Cloudflare D1 backend over the HTTP query API.
//!
//! `POST {api_base}/accounts/{account_id}/d1/database/{database_id}/query`
//! with `{"sql": "...", "params": [...]}` and a bearer token. The response is
//! the standard Cloudflare envelope:
//!
//! ```json
//! {"success": true, "errors": [], "result": [{"results": [...], "success": true,
//!   "meta": {"changes": 1, "last_row_id": 7}}]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use posts_core::config::{Backend, D1BindingConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::store::RecordStore;
use crate::value::{Row, SqlValue};

const USER_AGENT: &str = "posts-store";

/// Shared HTTP client used to build a [`D1Store`] for each execution context.
#[derive(Clone)]
pub struct D1Connector {
    http: reqwest::Client,
}

impl D1Connector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Wrap a binding in the common query interface.
    pub fn connect(&self, binding: &D1BindingConfig) -> D1Store {
        D1Store {
            http: self.http.clone(),
            binding: binding.clone(),
        }
    }
}

/// Handle to one D1 database. Cheap to build; not cached between contexts.
pub struct D1Store {
    http: reqwest::Client,
    binding: D1BindingConfig,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    sql: &'a str,
    params: Vec<Value>,
}

/// The query API takes `params` as strings; column affinity converts them
/// back (an INTEGER column compares `"1700000000"` numerically).
fn d1_param(v: &SqlValue) -> Value {
    match v {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::String(i.to_string()),
        SqlValue::Real(f) => Value::String(f.to_string()),
        SqlValue::Text(s) => Value::String(s.clone()),
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    results: Vec<Row>,
    #[serde(default = "bool_true")]
    success: bool,
    #[serde(default)]
    meta: QueryMeta,
}

#[derive(Debug, Default, Deserialize)]
struct QueryMeta {
    #[serde(default)]
    changes: u64,
}

fn bool_true() -> bool {
    true
}

impl D1Store {
    fn query_url(&self) -> String {
        format!(
            "{}/accounts/{}/d1/database/{}/query",
            self.binding.api_base.trim_end_matches('/'),
            self.binding.account_id,
            self.binding.database_id
        )
    }

    async fn run(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        let resp = self
            .http
            .post(self.query_url())
            .bearer_auth(&self.binding.api_token)
            .json(&QueryRequest {
                sql,
                params: params.iter().map(d1_param).collect(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            warn!(%status, error = %e, "D1 returned a non-JSON body");
            StoreError::Unavailable(format!("D1 responded {status} with an unreadable body"))
        })?;

        if !status.is_success() || !envelope.success {
            return Err(StoreError::Unavailable(describe_errors(status, &envelope.errors)));
        }

        let result = envelope
            .result
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("D1 response carried no result".into()))?;
        if !result.success {
            return Err(StoreError::Unavailable("D1 statement failed".into()));
        }
        debug!(
            database_id = %self.binding.database_id,
            rows = result.results.len(),
            changes = result.meta.changes,
            "D1 query complete"
        );
        Ok(result)
    }
}

fn describe_errors(status: reqwest::StatusCode, errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return format!("D1 request failed with status {status}");
    }
    let detail = errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ");
    format!("D1 request failed with status {status}: {detail}")
}

#[async_trait]
impl RecordStore for D1Store {
    fn backend(&self) -> Backend {
        Backend::Managed
    }

    async fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        Ok(self.run(sql, params).await?.results)
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        Ok(self.run(sql, params).await?.meta.changes)
    }
}

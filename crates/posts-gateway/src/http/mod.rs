pub mod health;
pub mod posts;
pub mod scheduled;
pub mod triggers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use posts_store::StoreError;
use serde_json::{json, Value};
use tracing::error;

/// JSON `{ "error": message }` with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Log a store failure with full context. The caller decides what, if
/// anything, of it reaches the client.
pub(crate) fn log_store_error(route: &str, err: &StoreError) {
    error!(route, code = err.code(), error = %err, "request failed");
}

/// Best-effort JSON body parse; empty or malformed bodies yield `None`.
pub(crate) fn parse_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

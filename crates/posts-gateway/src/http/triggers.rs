//! Database trigger endpoints under /trigger/*. Routed by path only; the
//! request method is not checked.
//!
//! `post-created` and `post-updated` only record the event. `cleanup` hands
//! the age-based delete to the lifecycle and answers immediately.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{error_response, log_store_error};
use crate::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostCreated {
    post_id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostUpdated {
    post_id: i64,
    old_name: String,
    new_name: String,
}

fn handled(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

/// /trigger/post-created
pub async fn post_created_handler(body: Bytes) -> Response {
    match serde_json::from_slice::<PostCreated>(&body) {
        Ok(ev) => {
            info!(post_id = ev.post_id, name = %ev.name, "post created");
            handled("Post creation handled")
        }
        Err(e) => {
            warn!(error = %e, "unreadable post-created trigger");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to handle post creation",
            )
        }
    }
}

/// /trigger/post-updated
pub async fn post_updated_handler(body: Bytes) -> Response {
    match serde_json::from_slice::<PostUpdated>(&body) {
        Ok(ev) => {
            info!(
                post_id = ev.post_id,
                old_name = %ev.old_name,
                new_name = %ev.new_name,
                "post updated"
            );
            handled("Post update handled")
        }
        Err(e) => {
            warn!(error = %e, "unreadable post-updated trigger");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to handle post update",
            )
        }
    }
}

/// /trigger/cleanup: delete posts older than `cleanup.retention_days`
/// in the background.
pub async fn cleanup_handler(State(state): State<Arc<AppState>>) -> Response {
    let repo = match state.repository() {
        Ok(repo) => repo,
        Err(e) => {
            log_store_error("/trigger/cleanup", &e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initiate cleanup",
            );
        }
    };

    let days = state.config.cleanup.retention_days;
    state.lifecycle.wait_until(async move {
        match repo.delete_older_than_days(days, Utc::now()).await {
            Ok(deleted) => info!(deleted, retention_days = days, "cleanup finished"),
            Err(e) => error!(code = e.code(), error = %e, "cleanup failed"),
        }
    });

    info!(retention_days = days, "cleanup initiated");
    handled("Cleanup initiated")
}

/// Fallback for unknown /trigger/* paths.
pub async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, "Trigger endpoint not found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_payloads_use_camel_case() {
        let ev: PostUpdated =
            serde_json::from_str(r#"{"postId":3,"oldName":"a","newName":"b"}"#).unwrap();
        assert_eq!(ev.post_id, 3);
        assert_eq!(ev.old_name, "a");
        assert_eq!(ev.new_name, "b");

        assert!(serde_json::from_str::<PostCreated>(r#"{"post_id":3,"name":"a"}"#).is_err());
    }
}

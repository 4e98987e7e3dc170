//! Scheduled-insert endpoint: POST /api/scheduled.
//!
//! Called by the trigger relay on every timer firing. Inserts one post named
//! `"<label> - <ISO-8601 timestamp>"`.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use posts_core::types::TriggerEvent;
use rand::{seq::SliceRandom, Rng};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::{error_response, log_store_error};
use crate::app::AppState;

const ROUTE: &str = "/api/scheduled";

/// Labels a scheduled post name is drawn from.
pub const LABELS: [&str; 8] = [
    "Scheduled Post",
    "Auto Generated",
    "Cron Task",
    "Timer Post",
    "Background Job",
    "Scheduled Entry",
    "Auto Insert",
    "Trigger Post",
];

/// POST /api/scheduled: insert one generated post.
pub async fn scheduled_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    match serde_json::from_slice::<TriggerEvent>(&body) {
        Ok(event) => info!(
            cron = %event.cron,
            scheduled_time = event.scheduled_time,
            source = event.source.as_deref().unwrap_or("unknown"),
            "scheduled task triggered"
        ),
        Err(_) => info!("scheduled task triggered"),
    }

    let name = scheduled_post_name(&mut rand::thread_rng(), Utc::now());

    let result = match state.repository() {
        Ok(repo) => repo.create(&name).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(post) => {
            info!(id = post.id, name = %post.name, "scheduled post created");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Scheduled task completed",
                    "post": post,
                })),
            )
                .into_response()
        }
        Err(e) => {
            log_store_error(ROUTE, &e);
            warn!("scheduled task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Scheduled task failed" })),
            )
                .into_response()
        }
    }
}

/// `"<random label> - <timestamp>"`, timestamp in RFC 3339 with milliseconds
/// and a `Z` suffix (e.g. `2026-10-18T12:00:00.000Z`).
pub fn scheduled_post_name<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> String {
    let label = LABELS.choose(rng).copied().unwrap_or(LABELS[0]);
    format!(
        "{label} - {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

//! Posts endpoint: GET/POST /api/posts.
//!
//! Request:  `POST {"name": "hello"}`
//! Response: `GET → 200 {"posts": [...]}`, `POST → 201 {"post": {...}}`
//! Error:    `400 {"error": "Name is required"}`, `500 {"error": "Internal server error"}`

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{error_response, log_store_error, parse_body};
use crate::app::AppState;

const ROUTE: &str = "/api/posts";

/// /api/posts: list or create posts. Any other method gets 405.
pub async fn posts_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Response {
    match method {
        Method::GET => list_posts(&state).await,
        Method::POST => create_post(&state, &body).await,
        other => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, POST")],
            format!("Method {other} Not Allowed"),
        )
            .into_response(),
    }
}

async fn list_posts(state: &AppState) -> Response {
    let result = match state.repository() {
        Ok(repo) => repo.list_all().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(posts) => (StatusCode::OK, Json(json!({ "posts": posts }))).into_response(),
        Err(e) => {
            log_store_error(ROUTE, &e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn create_post(state: &AppState, body: &[u8]) -> Response {
    let Some(name) = requested_name(body) else {
        debug!("POST /api/posts without a usable name");
        return error_response(StatusCode::BAD_REQUEST, "Name is required");
    };

    let result = match state.repository() {
        Ok(repo) => repo.create(&name).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(post) => (StatusCode::CREATED, Json(json!({ "post": post }))).into_response(),
        Err(e) if e.is_validation() => error_response(StatusCode::BAD_REQUEST, "Name is required"),
        Err(e) => {
            log_store_error(ROUTE, &e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// The `name` field of a JSON body, if it is a non-blank string.
fn requested_name(body: &[u8]) -> Option<String> {
    let value = parse_body(body)?;
    value
        .get("name")?
        .as_str()
        .filter(|n| !n.trim().is_empty())
        .map(str::to_owned)
}

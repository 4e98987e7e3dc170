//! `posts-gateway`: HTTP surface of the posts service.
//!
//! Routes:
//!
//! | Path                      | Methods   | Handler                          |
//! |---------------------------|-----------|----------------------------------|
//! | `/api/posts`              | GET, POST | [`http::posts::posts_handler`]   |
//! | `/api/scheduled`          | POST      | [`http::scheduled::scheduled_handler`] |
//! | `/trigger/post-created`   | any       | [`http::triggers`]               |
//! | `/trigger/post-updated`   | any       | [`http::triggers`]               |
//! | `/trigger/cleanup`        | any       | [`http::triggers`]               |
//! | `/health`                 | GET       | [`http::health::health_handler`] |

pub mod app;
pub mod cleanup;
pub mod http;
pub mod lifecycle;

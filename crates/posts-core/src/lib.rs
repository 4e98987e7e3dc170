//! `posts-core`: configuration, error and wire types shared by every crate
//! in the posts workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::PostsConfig;
pub use error::{PostsError, Result};
pub use types::{Post, TriggerEvent};

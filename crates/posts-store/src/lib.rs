//! `posts-store`: record store client and the typed post repository.
//!
//! # Overview
//!
//! Every backend implements [`store::RecordStore`], a small statement-level
//! interface (`fetch_all` / `execute`). [`client::StoreClient`] is chosen once
//! at startup and hands out handles:
//!
//! | Variant   | Handle                                        | Identity          |
//! |-----------|-----------------------------------------------|-------------------|
//! | `Local`   | shared [`local::LocalStore`] (rusqlite)       | stable per process |
//! | `Managed` | fresh [`managed::D1Store`] per context (D1 HTTP API) | per call    |
//!
//! [`repository::PostRepository`] sits on top of any handle and is the only
//! code that knows the `posts` table layout.

pub mod client;
pub mod context;
pub mod db;
pub mod error;
pub mod local;
pub mod managed;
pub mod repository;
pub mod store;
pub mod value;

pub use client::StoreClient;
pub use context::ExecutionContext;
pub use error::{Result, StoreError};
pub use local::LocalStore;
pub use managed::{D1Connector, D1Store};
pub use repository::PostRepository;
pub use store::RecordStore;
pub use value::{Row, SqlValue};

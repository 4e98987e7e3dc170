//! `posts-relay`: timer-driven trigger relay.
//!
//! # Overview
//!
//! The [`engine::RelayEngine`] sleeps until the next instant matched by its
//! [`schedule::CronSchedule`], then POSTs a [`posts_core::TriggerEvent`] to
//! `{MAIN_WORKER_URL}/api/scheduled`. Delivery failures are logged and
//! swallowed; the next tick is the retry.
//!
//! # Cron syntax
//!
//! | Field        | Range | Notes                         |
//! |--------------|-------|-------------------------------|
//! | minute       | 0-59  |                               |
//! | hour         | 0-23  |                               |
//! | day of month | 1-31  |                               |
//! | month        | 1-12  |                               |
//! | day of week  | 0-7   | 0 and 7 are both Sunday       |
//!
//! Each field accepts `*`, `N`, `A-B`, `*/S`, `A-B/S`, `N/S` and comma lists.

pub mod engine;
pub mod error;
pub mod schedule;

pub use engine::RelayEngine;
pub use error::{RelayError, Result};
pub use schedule::CronSchedule;

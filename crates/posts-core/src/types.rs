use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag the relay stamps on every trigger event it emits.
pub const TRIGGER_SOURCE: &str = "cron-worker";

/// A persisted post row.
///
/// Timestamps are integer seconds since the Unix epoch, assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    /// Reserved for mutation tracking; no code path writes it yet.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// Body the trigger relay POSTs to `/api/scheduled` on every timer firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    /// Cron expression of the schedule that fired.
    pub cron: String,
    /// Planned firing time in milliseconds since the Unix epoch.
    pub scheduled_time: i64,
    #[serde(default)]
    pub source: Option<String>,
}

impl TriggerEvent {
    pub fn new(cron: impl Into<String>, scheduled: DateTime<Utc>) -> Self {
        Self {
            cron: cron.into(),
            scheduled_time: scheduled.timestamp_millis(),
            source: Some(TRIGGER_SOURCE.to_string()),
        }
    }
}

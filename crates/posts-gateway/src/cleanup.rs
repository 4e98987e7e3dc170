use std::sync::Arc;

use chrono::Utc;
use posts_core::config::CleanupConfig;
use posts_relay::{CronSchedule, RelayError};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::app::AppState;

/// Periodic age-based delete, driven by `cleanup.schedule`.
pub struct CleanupJob {
    schedule: CronSchedule,
    retention_days: u32,
}

impl CleanupJob {
    pub fn new(schedule: CronSchedule, retention_days: u32) -> Self {
        Self {
            schedule,
            retention_days,
        }
    }

    /// `Ok(None)` when no schedule is configured.
    pub fn from_config(config: &CleanupConfig) -> Result<Option<Self>, RelayError> {
        match config.schedule.as_deref() {
            None => Ok(None),
            Some(expr) => Ok(Some(Self::new(
                CronSchedule::parse(expr)?,
                config.retention_days,
            ))),
        }
    }

    /// One pass. Returns the number of deleted rows, or `None` on failure
    /// (already logged).
    pub async fn run_once(&self, state: &AppState) -> Option<u64> {
        let result = match state.repository() {
            Ok(repo) => {
                repo.delete_older_than_days(self.retention_days, Utc::now())
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(deleted) => {
                info!(deleted, retention_days = self.retention_days, "scheduled cleanup finished");
                Some(deleted)
            }
            Err(e) => {
                error!(code = e.code(), error = %e, "scheduled cleanup failed");
                None
            }
        }
    }

    /// Loop until `shutdown` broadcasts `true`.
    pub async fn run(self, state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) {
        info!(cron = %self.schedule, retention_days = self.retention_days, "cleanup job started");
        let mut last_fired = None;
        loop {
            let now = Utc::now();
            let Some(next) = self.schedule.next_fire(now, last_fired) else {
                warn!(cron = %self.schedule, "cleanup schedule never fires again; job stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_fired = Some(next);
                    self.run_once(&state).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("cleanup job shutting down");
                        break;
                    }
                }
            }
        }
    }
}

use std::time::Duration;

use chrono::Utc;
use posts_core::config::RelayConfig;
use posts_core::types::TriggerEvent;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{RelayError, Result};
use crate::schedule::CronSchedule;

const USER_AGENT: &str = "posts-relay";
const SCHEDULED_PATH: &str = "/api/scheduled";

/// Bridges timer firings to the `/api/scheduled` HTTP endpoint.
pub struct RelayEngine {
    client: reqwest::Client,
    target: String,
    schedule: CronSchedule,
}

impl RelayEngine {
    pub fn new(main_worker_url: &str, schedule: CronSchedule, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            target: format!("{}{}", main_worker_url.trim_end_matches('/'), SCHEDULED_PATH),
            schedule,
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let schedule = CronSchedule::parse(&config.cron)?;
        Self::new(
            &config.main_worker_url,
            schedule,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Full URL the relay POSTs to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    /// Trigger event for a firing at the current instant.
    pub fn event_now(&self) -> TriggerEvent {
        TriggerEvent::new(self.schedule.expression(), Utc::now())
    }

    /// Deliver one trigger event. Non-2xx responses become [`RelayError::Status`].
    pub async fn fire(&self, event: &TriggerEvent) -> Result<Value> {
        let resp = self
            .client
            .post(&self.target)
            .json(event)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Status { status });
        }
        Ok(resp.json().await?)
    }

    /// Deliver one trigger event, logging the outcome. Never fails: the next
    /// tick is the only retry.
    pub async fn handle(&self, event: &TriggerEvent) {
        info!(cron = %event.cron, scheduled_time = event.scheduled_time, "cron trigger activated");
        match self.fire(event).await {
            Ok(result) => info!(%result, "scheduled task completed successfully"),
            Err(e) => error!(target_url = %self.target, error = %e, "cron relay error"),
        }
    }

    /// Main loop. Sleeps until each cron instant and fires, until `shutdown`
    /// broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(cron = %self.schedule, target_url = %self.target, "trigger relay started");
        let mut last_fired = None;
        loop {
            let now = Utc::now();
            let Some(next) = self.schedule.next_fire(now, last_fired) else {
                warn!(cron = %self.schedule, "schedule never fires again; relay stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_fired = Some(next);
                    let event = TriggerEvent::new(self.schedule.expression(), next);
                    self.handle(&event).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("trigger relay shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_joins_base_url() {
        let schedule = CronSchedule::parse("* * * * *").unwrap();
        let engine =
            RelayEngine::new("https://posts.example.dev/", schedule, Duration::from_secs(5)).unwrap();
        assert_eq!(engine.target(), "https://posts.example.dev/api/scheduled");
    }

    #[test]
    fn from_config_rejects_bad_cron() {
        let config = RelayConfig {
            cron: "every minute".into(),
            ..RelayConfig::default()
        };
        assert!(matches!(
            RelayEngine::from_config(&config),
            Err(RelayError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn event_carries_expression() {
        let engine = RelayEngine::from_config(&RelayConfig::default()).unwrap();
        let ev = engine.event_now();
        assert_eq!(ev.cron, "* * * * *");
        assert_eq!(ev.source.as_deref(), Some("cron-worker"));
    }
}

// Relay delivery against a mocked gateway.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockito::Matcher;
use posts_core::types::TriggerEvent;
use posts_relay::{CronSchedule, RelayEngine, RelayError};
use serde_json::json;

fn engine(server: &mockito::ServerGuard) -> RelayEngine {
    RelayEngine::new(
        &server.url(),
        CronSchedule::parse("* * * * *").unwrap(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn event() -> TriggerEvent {
    TriggerEvent::new("* * * * *", Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
}

#[tokio::test]
async fn fire_posts_trigger_event_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/scheduled")
        .match_header("content-type", "application/json")
        .match_header("user-agent", "posts-relay")
        .match_body(Matcher::Json(json!({
            "cron": "* * * * *",
            "scheduledTime": 1792324800000_i64,
            "source": "cron-worker"
        })))
        .with_status(200)
        .with_body(r#"{"success":true,"message":"Scheduled task completed"}"#)
        .create_async()
        .await;

    let result = engine(&server).fire(&event()).await.unwrap();
    assert_eq!(result["success"], true);
    mock.assert_async().await;
}

#[tokio::test]
async fn fire_reports_non_2xx_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/scheduled")
        .with_status(500)
        .with_body(r#"{"success":false,"error":"Scheduled task failed"}"#)
        .create_async()
        .await;

    let err = engine(&server).fire(&event()).await.unwrap_err();
    assert!(matches!(err, RelayError::Status { status } if status.as_u16() == 500));
}

#[tokio::test]
async fn handle_swallows_failures_without_retrying() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/scheduled")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    // Returns normally even though delivery failed.
    engine(&server).handle(&event()).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn handle_swallows_connection_errors() {
    // Nothing listens on port 9 in the test environment.
    let engine = RelayEngine::new(
        "http://127.0.0.1:9",
        CronSchedule::parse("* * * * *").unwrap(),
        Duration::from_millis(500),
    )
    .unwrap();
    engine.handle(&event()).await;
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let server = mockito::Server::new_async().await;
    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(engine(&server).run(rx));

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("relay did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn run_fires_once_per_tick() {
    let mut server = mockito::Server::new_async().await;
    let schedule = CronSchedule::parse("* * * * *").unwrap();

    // the loop picks its first tick right after spawn; allow for a minute rollover
    let tick = schedule.next_after(Utc::now()).unwrap();
    let ticks = [tick, schedule.next_after(tick).unwrap()];
    let mock = server
        .mock("POST", "/api/scheduled")
        .match_body(Matcher::AnyOf(
            ticks
                .iter()
                .map(|t| {
                    Matcher::Json(json!({
                        "cron": "* * * * *",
                        "scheduledTime": t.timestamp_millis(),
                        "source": "cron-worker"
                    }))
                })
                .collect(),
        ))
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .expect(1)
        .create_async()
        .await;

    // Long HTTP timeout: paused time advances while the request is in flight.
    let engine = RelayEngine::new(&server.url(), schedule, Duration::from_secs(3600)).unwrap();
    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(engine.run(rx));

    tokio::time::timeout(Duration::from_secs(600), async {
        while !mock.matched_async().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("relay never fired");

    // The wall clock still reads before the tick the loop slept until, so the
    // next firing must be a full minute away, not an immediate repeat. A
    // blocking task holds paused time still while real time passes.
    tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_millis(300)))
        .await
        .unwrap();
    mock.assert_async().await;

    tx.send(true).unwrap();
    task.await.unwrap();
}

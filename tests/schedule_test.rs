//! Integration tests for the schedule driver.

use std::sync::Arc;
use std::time::Duration;

use mediascan::db::{self, Cadence, Database, TriggerKind};
use mediascan::fetch::{HtmlFetcher, RssFetcher};
use mediascan::scrape::{CampaignRunner, ScheduleDriver, SourceCollector};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn driver(db: &Database) -> ScheduleDriver {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let collector = SourceCollector::new(
        db.clone(),
        Arc::new(RssFetcher::new(client.clone())),
        Arc::new(HtmlFetcher::new(client, 100)),
        None,
    );
    let runner = Arc::new(CampaignRunner::new(
        db.clone(),
        collector,
        None,
        None,
        None,
        200,
    ));
    ScheduleDriver::new(
        db.clone(),
        runner,
        Duration::from_millis(50),
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn test_tick_without_schedule_does_nothing() {
    let (db, _tmp) = setup_db().await;
    let driver = driver(&db);
    assert!(!driver.tick().await.unwrap());
    assert!(db::list_tasks(db.pool(), 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disabled_schedule_never_fires() {
    let (db, _tmp) = setup_db().await;
    let past = db::format_timestamp(chrono::Utc::now() - chrono::Duration::hours(1));
    db::set_schedule(db.pool(), false, Cadence::Hourly, 30, 5, 5, &past)
        .await
        .unwrap();

    let driver = driver(&db);
    assert!(!driver.tick().await.unwrap());
    assert!(db::list_tasks(db.pool(), 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_due_schedule_fires_exactly_once_per_cycle() {
    let (db, _tmp) = setup_db().await;
    // Due: the next run time is already in the past.
    let past = db::format_timestamp(chrono::Utc::now() - chrono::Duration::hours(1));
    db::set_schedule(db.pool(), true, Cadence::Daily, 30, 5, 5, &past)
        .await
        .unwrap();

    let driver = driver(&db);
    assert!(driver.tick().await.unwrap());

    // One automatic task, completed (no sources configured means an empty
    // but successful campaign).
    let tasks = db::list_tasks(db.pool(), 10, 0).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].trigger_kind, TriggerKind::Automatic.as_str());
    assert_eq!(tasks[0].status, "completed");
    assert!(tasks[0].finished_at.is_some());

    // The schedule advanced a full cadence, so the next cycle stays quiet.
    let schedule = db::get_schedule(db.pool()).await.unwrap().unwrap();
    assert!(schedule.last_run_at.is_some());
    let next = db::parse_timestamp(schedule.next_run_at.as_deref().unwrap()).unwrap();
    assert!(next > chrono::Utc::now() + chrono::Duration::hours(23));

    assert!(!driver.tick().await.unwrap());
    assert_eq!(db::list_tasks(db.pool(), 10, 0).await.unwrap().len(), 1);
}

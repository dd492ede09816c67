//! Integration tests for the trigger surface.

use std::sync::Arc;
use std::time::Duration;

use mediascan::db::{self, Cadence, Database, TaskStatus};
use mediascan::fetch::{HtmlFetcher, RssFetcher};
use mediascan::scrape::{CampaignRunner, ScrapeService, SourceCollector, TriggerParams};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn service_with_timeout(db: &Database, campaign_timeout: Duration) -> ScrapeService {
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
    ScrapeService::new(db.clone(), runner, campaign_timeout)
}

fn service(db: &Database) -> ScrapeService {
    service_with_timeout(db, Duration::from_secs(30))
}

fn params(site_url: Option<String>) -> TriggerParams {
    TriggerParams {
        site_url,
        window_days: 30,
        fb_limit: 5,
        tw_limit: 5,
        skip_facebook: true,
        skip_twitter: true,
    }
}

#[tokio::test]
async fn test_invalid_trigger_creates_no_task() {
    let (db, _tmp) = setup_db().await;
    let service = service(&db);

    assert!(service.trigger(params(Some("not a url".into()))).await.is_err());
    let bad_window = TriggerParams {
        window_days: 0,
        ..params(None)
    };
    assert!(service.trigger(bad_window).await.is_err());

    assert!(service.list_tasks(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_site_trigger_records_a_completed_task() {
    let (db, _tmp) = setup_db().await;
    let server = MockServer::start().await;
    let now = chrono::Utc::now().to_rfc2822();
    let feed = format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>F</title>
<link>{0}</link>
<item><title>Une dépêche</title><link>{0}/articles/one</link>
<pubDate>{now}</pubDate><description>Texte.</description></item>
</channel></rss>"#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(feed, "application/rss+xml"))
        .mount(&server)
        .await;

    let service = service(&db);
    let (task_id, summary) = service
        .trigger_and_wait(params(Some(server.uri())))
        .await
        .unwrap();

    let summary = summary.expect("campaign should complete");
    assert_eq!(summary.total_articles, 1);

    let task = service.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.status_enum(), Some(TaskStatus::Completed));
    assert_eq!(task.trigger_kind, "manual");
    assert_eq!(task.total_articles, 1);

    // The site was registered as a side effect of the single-URL scope.
    assert!(db::get_media_by_url(db.pool(), &server.uri())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_background_trigger_finalizes_the_task() {
    let (db, _tmp) = setup_db().await;
    let service = service(&db);

    // No sources configured: an empty campaign that completes quickly.
    let task_id = service.trigger(params(None)).await.unwrap();

    let mut status = None;
    for _ in 0..100 {
        let task = service.get_task(task_id).await.unwrap().unwrap();
        if matches!(
            task.status_enum(),
            Some(TaskStatus::Completed | TaskStatus::Failed)
        ) {
            status = task.status_enum();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, Some(TaskStatus::Completed));
}

#[tokio::test]
async fn test_slow_campaign_fails_the_task_with_timeout() {
    let (db, _tmp) = setup_db().await;
    let server = MockServer::start().await;
    // Every fetch hangs longer than the campaign is allowed to run.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let service = service_with_timeout(&db, Duration::from_millis(200));
    let (task_id, summary) = service
        .trigger_and_wait(params(Some(server.uri())))
        .await
        .unwrap();
    assert!(summary.is_none());

    let task = service.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.status_enum(), Some(TaskStatus::Failed));
    assert_eq!(task.error_message.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn test_schedule_management_round_trip() {
    let (db, _tmp) = setup_db().await;
    let service = service(&db);

    assert!(service.get_schedule().await.unwrap().is_none());
    service
        .set_schedule(true, Cadence::Daily, 30, 5, 5)
        .await
        .unwrap();

    let schedule = service.get_schedule().await.unwrap().unwrap();
    assert!(schedule.enabled);
    assert_eq!(schedule.cadence_enum(), Some(Cadence::Daily));
    // First automatic run is one interval out.
    let next = db::parse_timestamp(schedule.next_run_at.as_deref().unwrap()).unwrap();
    assert!(next > chrono::Utc::now() + chrono::Duration::hours(23));

    assert!(service.set_schedule(true, Cadence::Daily, 0, 5, 5).await.is_err());

    service.clear_schedule().await.unwrap();
    assert!(service.get_schedule().await.unwrap().is_none());
}

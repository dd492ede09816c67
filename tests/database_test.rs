//! Integration tests for the persistence layer.

use mediascan::db::{
    self, Cadence, ContentKind, Database, NewArticle, NewFacebookPost, NewModerationRecord,
    TaskStatus, TriggerKind,
};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn article(media_id: i64, url: &str) -> NewArticle {
    NewArticle {
        media_id,
        url: url.to_string(),
        title: "Titre".to_string(),
        content: "Contenu.".to_string(),
        image_url: None,
        published_at: Some(db::format_timestamp(chrono::Utc::now())),
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.sqlite");

    let db = Database::new(&db_path).await.unwrap();
    let media_id = db::upsert_media(db.pool(), "Test", "https://example.com", "rss")
        .await
        .unwrap();
    drop(db);

    // Reopening must not re-run migrations or lose data.
    let db = Database::new(&db_path).await.unwrap();
    let media = db::get_media(db.pool(), media_id).await.unwrap().unwrap();
    assert_eq!(media.name, "Test");
}

#[tokio::test]
async fn test_media_upsert_keeps_identity_and_refreshes_kind() {
    let (db, _tmp) = setup_db().await;
    let first = db::upsert_media(db.pool(), "Test", "https://example.com", "unknown")
        .await
        .unwrap();
    let second = db::upsert_media(db.pool(), "Test", "https://example.com", "html")
        .await
        .unwrap();
    assert_eq!(first, second);

    let media = db::get_media(db.pool(), first).await.unwrap().unwrap();
    assert_eq!(media.site_kind, "html");

    // A later pass that learned nothing keeps the known kind.
    db::upsert_media(db.pool(), "Test", "https://example.com", "unknown")
        .await
        .unwrap();
    let media = db::get_media(db.pool(), first).await.unwrap().unwrap();
    assert_eq!(media.site_kind, "html");
}

#[tokio::test]
async fn test_article_url_is_a_natural_key() {
    let (db, _tmp) = setup_db().await;
    let media_id = db::upsert_media(db.pool(), "Test", "https://example.com", "rss")
        .await
        .unwrap();

    let url = "https://example.com/articles/one";
    assert!(!db::article_exists(db.pool(), url).await.unwrap());
    db::insert_article(db.pool(), &article(media_id, url))
        .await
        .unwrap();
    assert!(db::article_exists(db.pool(), url).await.unwrap());

    // A second insert of the same URL violates the unique constraint.
    assert!(db::insert_article(db.pool(), &article(media_id, url))
        .await
        .is_err());
    assert_eq!(db::count_articles(db.pool(), None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_classification_upsert_keeps_one_record_per_article() {
    let (db, _tmp) = setup_db().await;
    let media_id = db::upsert_media(db.pool(), "Test", "https://example.com", "rss")
        .await
        .unwrap();
    let article_id = db::insert_article(db.pool(), &article(media_id, "https://example.com/a/1"))
        .await
        .unwrap();

    db::upsert_classification(db.pool(), article_id, "politics", 0.8, "[]", "first", "ollama")
        .await
        .unwrap();
    db::upsert_classification(
        db.pool(),
        article_id,
        "economy",
        0.6,
        "[]",
        "second",
        "keyword_fallback",
    )
    .await
    .unwrap();

    let record = db::get_classification(db.pool(), article_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.category, "economy");
    assert_eq!(record.method, "keyword_fallback");
    assert!(db::get_unclassified_articles(db.pool(), 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_facebook_post_upsert_refreshes_counters_only() {
    let (db, _tmp) = setup_db().await;
    let media_id = db::upsert_media(db.pool(), "Test", "https://example.com", "rss")
        .await
        .unwrap();

    let mut post = NewFacebookPost {
        media_id,
        post_id: "p1".to_string(),
        message: "Message initial".to_string(),
        url: "https://facebook.com/p1".to_string(),
        image_url: None,
        published_at: Some(db::format_timestamp(chrono::Utc::now())),
        likes: 1,
        comments: 2,
        shares: 3,
    };
    assert!(db::upsert_facebook_post(db.pool(), &post).await.unwrap());

    post.likes = 10;
    post.message = "Message modifié".to_string();
    assert!(!db::upsert_facebook_post(db.pool(), &post).await.unwrap());

    let stored = db::get_facebook_post_by_post_id(db.pool(), "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.likes, 10);
    assert_eq!(stored.engagement, 15);
    // Identity fields are not rewritten on refresh.
    assert_eq!(stored.message, "Message initial");
}

#[tokio::test]
async fn test_moderation_record_is_unique_per_content_item() {
    let (db, _tmp) = setup_db().await;
    let record = NewModerationRecord {
        content_kind: ContentKind::Article,
        content_id: 1,
        risk_score: 0.3,
        risk_level: "low".to_string(),
        toxic: false,
        misinformation: false,
        sensitive: false,
        should_flag: false,
        primary_issue: "none".to_string(),
        scores: "{}".to_string(),
    };
    db::upsert_moderation(db.pool(), &record).await.unwrap();
    assert!(db::moderation_exists(db.pool(), ContentKind::Article, 1)
        .await
        .unwrap());
    // Same id under another kind is a distinct item.
    assert!(!db::moderation_exists(db.pool(), ContentKind::Tweet, 1)
        .await
        .unwrap());

    let rescored = NewModerationRecord {
        risk_score: 0.9,
        risk_level: "critical".to_string(),
        should_flag: true,
        ..record
    };
    db::upsert_moderation(db.pool(), &rescored).await.unwrap();
    let stored = db::get_moderation(db.pool(), ContentKind::Article, 1)
        .await
        .unwrap()
        .unwrap();
    assert!((stored.risk_score - 0.9).abs() < f64::EPSILON);
    assert_eq!(db::get_flagged_content(db.pool(), 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let (db, _tmp) = setup_db().await;
    let id = db::create_task(db.pool(), TriggerKind::Manual, "{}")
        .await
        .unwrap();

    let task = db::get_task(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(task.status_enum(), Some(TaskStatus::Queued));
    assert!(task.finished_at.is_none());

    db::mark_task_running(db.pool(), id).await.unwrap();
    db::complete_task(db.pool(), id, 12, 3, 4, 1).await.unwrap();

    let task = db::get_task(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(task.status_enum(), Some(TaskStatus::Completed));
    assert_eq!(task.total_articles, 12);
    assert_eq!(task.total_flagged, 1);
    assert!(task.finished_at.is_some());

    let failed = db::create_task(db.pool(), TriggerKind::Automatic, "{}")
        .await
        .unwrap();
    db::fail_task(db.pool(), failed, "timeout").await.unwrap();
    let task = db::get_task(db.pool(), failed).await.unwrap().unwrap();
    assert_eq!(task.status_enum(), Some(TaskStatus::Failed));
    assert_eq!(task.error_message.as_deref(), Some("timeout"));

    // Newest first.
    let tasks = db::list_tasks(db.pool(), 10, 0).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, failed);
}

#[tokio::test]
async fn test_schedule_is_a_singleton() {
    let (db, _tmp) = setup_db().await;
    assert!(db::get_schedule(db.pool()).await.unwrap().is_none());

    let next = db::format_timestamp(chrono::Utc::now() + chrono::Duration::hours(1));
    db::set_schedule(db.pool(), true, Cadence::Hourly, 30, 5, 5, &next)
        .await
        .unwrap();
    db::set_schedule(db.pool(), true, Cadence::Weekly, 7, 10, 10, &next)
        .await
        .unwrap();

    let schedule = db::get_schedule(db.pool()).await.unwrap().unwrap();
    assert_eq!(schedule.cadence_enum(), Some(Cadence::Weekly));
    assert_eq!(schedule.window_days, 7);

    let now = db::format_timestamp(chrono::Utc::now());
    db::update_schedule_run(db.pool(), &now, &next).await.unwrap();
    let schedule = db::get_schedule(db.pool()).await.unwrap().unwrap();
    assert_eq!(schedule.last_run_at.as_deref(), Some(now.as_str()));

    db::clear_schedule(db.pool()).await.unwrap();
    assert!(db::get_schedule(db.pool()).await.unwrap().is_none());
}

//! Integration tests for audience analytics over seeded data.

use mediascan::analytics::{
    self, facebook_audience, global_audience, inactive_medias, web_audience, ActivityStatus,
};
use mediascan::db::{self, Database, NewArticle, NewFacebookPost, NewTwitterTweet};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

async fn seed_media(db: &Database, name: &str, url: &str) -> i64 {
    db::upsert_media(db.pool(), name, url, "rss").await.unwrap()
}

async fn seed_article(db: &Database, media_id: i64, slug: &str, days_ago: i64) {
    db::insert_article(
        db.pool(),
        &NewArticle {
            media_id,
            url: format!("https://example.com/{slug}"),
            title: slug.to_string(),
            content: "Contenu.".to_string(),
            image_url: None,
            published_at: Some(db::format_timestamp(
                chrono::Utc::now() - chrono::Duration::days(days_ago),
            )),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_web_audience_counts_and_activity() {
    let (db, _tmp) = setup_db().await;
    let busy = seed_media(&db, "Busy", "https://busy.example.com").await;
    let quiet = seed_media(&db, "Quiet", "https://quiet.example.com").await;
    seed_media(&db, "Silent", "https://silent.example.com").await;

    for i in 0..4 {
        seed_article(&db, busy, &format!("busy-{i}"), 0).await;
    }
    seed_article(&db, quiet, "quiet-0", 10).await;

    let entries = web_audience(&db, 30).await.unwrap();
    assert_eq!(entries.len(), 3);

    // Most prolific first.
    assert_eq!(entries[0].name, "Busy");
    assert_eq!(entries[0].total_articles, 4);
    assert_eq!(entries[0].activity, ActivityStatus::Today);
    assert!(entries[0].avg_articles_per_active_day > 3.9);

    let quiet_entry = entries.iter().find(|e| e.name == "Quiet").unwrap();
    assert_eq!(quiet_entry.total_articles, 1);
    assert_eq!(quiet_entry.activity, ActivityStatus::Occasional);

    // Never published: sentinel days and zero-guarded average.
    let silent_entry = entries.iter().find(|e| e.name == "Silent").unwrap();
    assert_eq!(silent_entry.total_articles, 0);
    assert_eq!(silent_entry.days_since_last_pub, 999);
    assert_eq!(silent_entry.activity, ActivityStatus::Never);
    assert!(silent_entry.avg_articles_per_active_day.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_global_ranking_blends_volume_and_engagement() {
    let (db, _tmp) = setup_db().await;

    // Prolific publishes more; Popular earns more engagement.
    let prolific = seed_media(&db, "Prolific", "https://prolific.example.com").await;
    let popular = seed_media(&db, "Popular", "https://popular.example.com").await;
    db::set_media_social_handles(db.pool(), popular, Some("popular"), Some("@popular"))
        .await
        .unwrap();

    for i in 0..5 {
        seed_article(&db, prolific, &format!("p-{i}"), 1).await;
    }
    seed_article(&db, popular, "pop-0", 1).await;
    db::upsert_facebook_post(
        db.pool(),
        &NewFacebookPost {
            media_id: popular,
            post_id: "pop-fb-1".to_string(),
            message: "Post".to_string(),
            url: "https://facebook.com/pop/1".to_string(),
            image_url: None,
            published_at: Some(db::format_timestamp(chrono::Utc::now())),
            likes: 150,
            comments: 30,
            shares: 20,
        },
    )
    .await
    .unwrap();
    db::upsert_twitter_tweet(
        db.pool(),
        &NewTwitterTweet {
            media_id: popular,
            tweet_id: "pop-tw-1".to_string(),
            text: "Tweet".to_string(),
            url: "https://twitter.com/i/web/status/1".to_string(),
            image_url: None,
            published_at: Some(db::format_timestamp(chrono::Utc::now())),
            retweets: 10,
            replies: 5,
            likes: 40,
            quotes: 5,
            impressions: 9000,
        },
    )
    .await
    .unwrap();

    let global = global_audience(&db, 30).await.unwrap();
    assert_eq!(global.total_articles, 6);
    assert_eq!(global.total_fb_posts, 1);
    assert_eq!(global.total_tweets, 1);
    // 200 Facebook interactions plus 60 tweet interactions.
    assert_eq!(global.total_engagement, 260);

    // Engagement is weighted heavier than volume: Popular outranks
    // Prolific despite publishing less.
    assert_eq!(global.ranking[0].name, "Popular");
    assert_eq!(global.ranking[0].volume, 3);
    assert_eq!(global.ranking[0].engagement, 260);
    assert!(global.ranking[0].influence_score > global.ranking[1].influence_score);
    assert_eq!(global.ranking[1].name, "Prolific");
    assert_eq!(global.ranking[1].engagement, 0);

    let expected = analytics::influence_score(3, 260);
    assert!((global.ranking[0].influence_score - expected).abs() < f64::EPSILON);

    // The Facebook view only covers medias with a configured page.
    let fb = facebook_audience(&db, 30).await.unwrap();
    assert_eq!(fb.len(), 1);
    assert_eq!(fb[0].total_engagement, 200);
    assert!((fb[0].avg_engagement_per_post - 200.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_inactive_medias_threshold() {
    let (db, _tmp) = setup_db().await;
    let fresh = seed_media(&db, "Fresh", "https://fresh.example.com").await;
    let stale = seed_media(&db, "Stale", "https://stale.example.com").await;
    seed_media(&db, "Silent", "https://silent.example.com").await;

    seed_article(&db, fresh, "fresh-0", 1).await;
    seed_article(&db, stale, "stale-0", 20).await;

    let inactive = inactive_medias(&db, 30, 14).await.unwrap();
    let names: Vec<&str> = inactive.iter().map(|e| e.name.as_str()).collect();
    // Worst first: never-published, then the 20-day-stale one.
    assert_eq!(names, vec!["Silent", "Stale"]);
}

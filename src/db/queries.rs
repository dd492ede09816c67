use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sqlx::SqlitePool;

use super::models::{
    Article, Cadence, ClassificationRecord, ContentKind, FacebookPost, Media, ModerationRecord,
    NewArticle, NewFacebookPost, NewModerationRecord, NewTwitterTweet, ScrapingLog,
    ScrapingSchedule, ScrapingTask, TaskStatus, TriggerKind, TwitterTweet,
};

// ========== Timestamps ==========

/// SQLite-comparable UTC timestamp, matching `datetime('now')` output.
#[must_use]
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parse a timestamp previously written by [`format_timestamp`] or SQLite.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Timestamp string for "now minus `days`", used as a window cutoff.
#[must_use]
pub fn window_cutoff(days: i64) -> String {
    format_timestamp(Utc::now() - Duration::days(days))
}

// ========== Medias ==========

/// Insert a media outlet or return the existing one, keyed by canonical URL.
///
/// An already-registered media keeps its identity; the site kind is refreshed
/// when the caller learned a more specific one than `unknown`.
pub async fn upsert_media(
    pool: &SqlitePool,
    name: &str,
    url: &str,
    site_kind: &str,
) -> Result<i64> {
    if let Some(existing) = get_media_by_url(pool, url).await? {
        if site_kind != "unknown" && existing.site_kind != site_kind {
            sqlx::query("UPDATE medias SET site_kind = ? WHERE id = ?")
                .bind(site_kind)
                .bind(existing.id)
                .execute(pool)
                .await
                .context("Failed to update media site kind")?;
        }
        return Ok(existing.id);
    }

    let result = sqlx::query(
        r"
        INSERT INTO medias (name, url, site_kind)
        VALUES (?, ?, ?)
        ON CONFLICT(url) DO UPDATE SET site_kind = excluded.site_kind
        ",
    )
    .bind(name)
    .bind(url)
    .bind(site_kind)
    .execute(pool)
    .await
    .context("Failed to insert media")?;

    Ok(result.last_insert_rowid())
}

/// Get a media outlet by its canonical URL.
pub async fn get_media_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Media>> {
    sqlx::query_as("SELECT * FROM medias WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch media by url")
}

/// Get a media outlet by id.
pub async fn get_media(pool: &SqlitePool, id: i64) -> Result<Option<Media>> {
    sqlx::query_as("SELECT * FROM medias WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch media")
}

/// All active media outlets in stable name order. This is the campaign
/// processing order.
pub async fn get_active_medias(pool: &SqlitePool) -> Result<Vec<Media>> {
    sqlx::query_as("SELECT * FROM medias WHERE active = 1 ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to fetch active medias")
}

/// Record a successful collection pass against a media outlet.
pub async fn update_media_last_scraped(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE medias SET last_scraped_at = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update media last_scraped_at")?;
    Ok(())
}

/// Configure the social handles for a media outlet.
pub async fn set_media_social_handles(
    pool: &SqlitePool,
    id: i64,
    facebook_page: Option<&str>,
    twitter_account: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE medias SET facebook_page = ?, twitter_account = ? WHERE id = ?")
        .bind(facebook_page)
        .bind(twitter_account)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update media social handles")?;
    Ok(())
}

/// Deactivate a media outlet. The pipeline never hard-deletes sources.
pub async fn set_media_active(pool: &SqlitePool, id: i64, active: bool) -> Result<()> {
    sqlx::query("UPDATE medias SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update media active flag")?;
    Ok(())
}

// ========== Articles ==========

/// Check whether an article with this external URL is already stored.
pub async fn article_exists(pool: &SqlitePool, url: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM articles WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await
        .context("Failed to check article existence")?;
    Ok(row.is_some())
}

/// Insert a new article, returning its ID.
///
/// The UNIQUE constraint on `url` backs the existence check; a concurrent
/// duplicate insert surfaces as an error rather than a second row.
pub async fn insert_article(pool: &SqlitePool, article: &NewArticle) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO articles (media_id, url, title, content, image_url, published_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(article.media_id)
    .bind(&article.url)
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.image_url)
    .bind(&article.published_at)
    .execute(pool)
    .await
    .context("Failed to insert article")?;

    Ok(result.last_insert_rowid())
}

/// Get an article by id.
pub async fn get_article(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    sqlx::query_as("SELECT * FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch article")
}

/// Get an article by its external URL.
pub async fn get_article_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Article>> {
    sqlx::query_as("SELECT * FROM articles WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch article by url")
}

/// Recently published articles, newest first.
pub async fn get_recent_articles(pool: &SqlitePool, days: i64, limit: i64) -> Result<Vec<Article>> {
    sqlx::query_as(
        r"
        SELECT * FROM articles
        WHERE published_at >= ? OR (published_at IS NULL AND collected_at >= ?)
        ORDER BY published_at DESC
        LIMIT ?
        ",
    )
    .bind(window_cutoff(days))
    .bind(window_cutoff(days))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch recent articles")
}

/// Count stored articles, optionally for one media outlet.
pub async fn count_articles(pool: &SqlitePool, media_id: Option<i64>) -> Result<i64> {
    let row: (i64,) = match media_id {
        Some(id) => {
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE media_id = ?")
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query_as("SELECT COUNT(*) FROM articles")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count articles")?;
    Ok(row.0)
}

/// Articles that have no classification record yet.
pub async fn get_unclassified_articles(pool: &SqlitePool, limit: i64) -> Result<Vec<Article>> {
    sqlx::query_as(
        r"
        SELECT a.* FROM articles a
        LEFT JOIN classifications c ON a.id = c.article_id
        WHERE c.id IS NULL
        ORDER BY a.collected_at DESC
        LIMIT ?
        ",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch unclassified articles")
}

// ========== Classifications ==========

/// Attach a classification to an article. Re-classification overwrites: at
/// most one live record per article.
pub async fn upsert_classification(
    pool: &SqlitePool,
    article_id: i64,
    category: &str,
    confidence: f64,
    keywords_json: &str,
    justification: &str,
    method: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO classifications (article_id, category, confidence, keywords, justification, method)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(article_id) DO UPDATE SET
            category = excluded.category,
            confidence = excluded.confidence,
            keywords = excluded.keywords,
            justification = excluded.justification,
            method = excluded.method,
            classified_at = datetime('now')
        ",
    )
    .bind(article_id)
    .bind(category)
    .bind(confidence)
    .bind(keywords_json)
    .bind(justification)
    .bind(method)
    .execute(pool)
    .await
    .context("Failed to upsert classification")?;
    Ok(())
}

/// Get the classification attached to an article.
pub async fn get_classification(
    pool: &SqlitePool,
    article_id: i64,
) -> Result<Option<ClassificationRecord>> {
    sqlx::query_as("SELECT * FROM classifications WHERE article_id = ?")
        .bind(article_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch classification")
}

/// Article counts per category within the window.
pub async fn get_category_stats(pool: &SqlitePool, days: i64) -> Result<Vec<(String, i64)>> {
    sqlx::query_as(
        r"
        SELECT c.category, COUNT(*) as n
        FROM classifications c
        JOIN articles a ON a.id = c.article_id
        WHERE a.collected_at >= ?
        GROUP BY c.category
        ORDER BY n DESC
        ",
    )
    .bind(window_cutoff(days))
    .fetch_all(pool)
    .await
    .context("Failed to fetch category stats")
}

// ========== Facebook posts ==========

/// Upsert a Facebook post by its platform post id.
///
/// Returns `true` when a new row was inserted. On conflict the engagement
/// counters are refreshed while identity and first-seen timestamp are kept.
pub async fn upsert_facebook_post(pool: &SqlitePool, post: &NewFacebookPost) -> Result<bool> {
    let existed = get_facebook_post_by_post_id(pool, &post.post_id)
        .await?
        .is_some();

    sqlx::query(
        r"
        INSERT INTO facebook_posts
            (media_id, post_id, message, url, image_url, published_at,
             likes, comments, shares, engagement)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(post_id) DO UPDATE SET
            likes = excluded.likes,
            comments = excluded.comments,
            shares = excluded.shares,
            engagement = excluded.engagement
        ",
    )
    .bind(post.media_id)
    .bind(&post.post_id)
    .bind(&post.message)
    .bind(&post.url)
    .bind(&post.image_url)
    .bind(&post.published_at)
    .bind(post.likes)
    .bind(post.comments)
    .bind(post.shares)
    .bind(post.engagement())
    .execute(pool)
    .await
    .context("Failed to upsert facebook post")?;

    Ok(!existed)
}

/// Get a Facebook post by its platform post id.
pub async fn get_facebook_post_by_post_id(
    pool: &SqlitePool,
    post_id: &str,
) -> Result<Option<FacebookPost>> {
    sqlx::query_as("SELECT * FROM facebook_posts WHERE post_id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch facebook post")
}

/// Recently published Facebook posts, newest first.
pub async fn get_recent_facebook_posts(
    pool: &SqlitePool,
    days: i64,
    limit: i64,
) -> Result<Vec<FacebookPost>> {
    sqlx::query_as(
        r"
        SELECT * FROM facebook_posts
        WHERE published_at >= ? OR (published_at IS NULL AND collected_at >= ?)
        ORDER BY published_at DESC
        LIMIT ?
        ",
    )
    .bind(window_cutoff(days))
    .bind(window_cutoff(days))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch recent facebook posts")
}

// ========== Twitter tweets ==========

/// Upsert a tweet by its platform tweet id. Same contract as
/// [`upsert_facebook_post`].
pub async fn upsert_twitter_tweet(pool: &SqlitePool, tweet: &NewTwitterTweet) -> Result<bool> {
    let existed = get_tweet_by_tweet_id(pool, &tweet.tweet_id).await?.is_some();

    sqlx::query(
        r"
        INSERT INTO twitter_tweets
            (media_id, tweet_id, text, url, image_url, published_at,
             retweets, replies, likes, quotes, impressions, engagement)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(tweet_id) DO UPDATE SET
            retweets = excluded.retweets,
            replies = excluded.replies,
            likes = excluded.likes,
            quotes = excluded.quotes,
            impressions = excluded.impressions,
            engagement = excluded.engagement
        ",
    )
    .bind(tweet.media_id)
    .bind(&tweet.tweet_id)
    .bind(&tweet.text)
    .bind(&tweet.url)
    .bind(&tweet.image_url)
    .bind(&tweet.published_at)
    .bind(tweet.retweets)
    .bind(tweet.replies)
    .bind(tweet.likes)
    .bind(tweet.quotes)
    .bind(tweet.impressions)
    .bind(tweet.engagement())
    .execute(pool)
    .await
    .context("Failed to upsert tweet")?;

    Ok(!existed)
}

/// Get a tweet by its platform tweet id.
pub async fn get_tweet_by_tweet_id(
    pool: &SqlitePool,
    tweet_id: &str,
) -> Result<Option<TwitterTweet>> {
    sqlx::query_as("SELECT * FROM twitter_tweets WHERE tweet_id = ?")
        .bind(tweet_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch tweet")
}

/// Recently published tweets, newest first.
pub async fn get_recent_tweets(
    pool: &SqlitePool,
    days: i64,
    limit: i64,
) -> Result<Vec<TwitterTweet>> {
    sqlx::query_as(
        r"
        SELECT * FROM twitter_tweets
        WHERE published_at >= ? OR (published_at IS NULL AND collected_at >= ?)
        ORDER BY published_at DESC
        LIMIT ?
        ",
    )
    .bind(window_cutoff(days))
    .bind(window_cutoff(days))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch recent tweets")
}

// ========== Moderation ==========

/// Check whether a moderation record exists for this content item.
pub async fn moderation_exists(
    pool: &SqlitePool,
    kind: ContentKind,
    content_id: i64,
) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM content_moderation WHERE content_kind = ? AND content_id = ?",
    )
    .bind(kind.as_str())
    .bind(content_id)
    .fetch_optional(pool)
    .await
    .context("Failed to check moderation existence")?;
    Ok(row.is_some())
}

/// Idempotent upsert keyed by (content kind, content id).
pub async fn upsert_moderation(pool: &SqlitePool, record: &NewModerationRecord) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO content_moderation
            (content_kind, content_id, risk_score, risk_level,
             toxic, misinformation, sensitive, should_flag, primary_issue, scores)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(content_kind, content_id) DO UPDATE SET
            risk_score = excluded.risk_score,
            risk_level = excluded.risk_level,
            toxic = excluded.toxic,
            misinformation = excluded.misinformation,
            sensitive = excluded.sensitive,
            should_flag = excluded.should_flag,
            primary_issue = excluded.primary_issue,
            scores = excluded.scores,
            analyzed_at = datetime('now')
        ",
    )
    .bind(record.content_kind.as_str())
    .bind(record.content_id)
    .bind(record.risk_score)
    .bind(&record.risk_level)
    .bind(record.toxic)
    .bind(record.misinformation)
    .bind(record.sensitive)
    .bind(record.should_flag)
    .bind(&record.primary_issue)
    .bind(&record.scores)
    .execute(pool)
    .await
    .context("Failed to upsert moderation record")?;
    Ok(())
}

/// Get the moderation record for a content item.
pub async fn get_moderation(
    pool: &SqlitePool,
    kind: ContentKind,
    content_id: i64,
) -> Result<Option<ModerationRecord>> {
    sqlx::query_as("SELECT * FROM content_moderation WHERE content_kind = ? AND content_id = ?")
        .bind(kind.as_str())
        .bind(content_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch moderation record")
}

/// Flagged content, most recently analyzed first.
pub async fn get_flagged_content(pool: &SqlitePool, limit: i64) -> Result<Vec<ModerationRecord>> {
    sqlx::query_as(
        r"
        SELECT * FROM content_moderation
        WHERE should_flag = 1
        ORDER BY analyzed_at DESC
        LIMIT ?
        ",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch flagged content")
}

// ========== Scraping logs ==========

/// Record one collection attempt against one media outlet.
pub async fn add_scraping_log(
    pool: &SqlitePool,
    media_id: i64,
    status: &str,
    method: &str,
    items_collected: i64,
    message: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO scraping_logs (media_id, status, method, items_collected, message)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(media_id)
    .bind(status)
    .bind(method)
    .bind(items_collected)
    .bind(message)
    .execute(pool)
    .await
    .context("Failed to insert scraping log")?;
    Ok(())
}

/// Most recent collection attempts for a media outlet.
pub async fn get_scraping_logs(
    pool: &SqlitePool,
    media_id: i64,
    limit: i64,
) -> Result<Vec<ScrapingLog>> {
    sqlx::query_as(
        "SELECT * FROM scraping_logs WHERE media_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(media_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch scraping logs")
}

// ========== Scraping tasks ==========

/// Create a queued task record, returning its ID.
pub async fn create_task(
    pool: &SqlitePool,
    trigger: TriggerKind,
    params_json: &str,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO scraping_tasks (trigger_kind, params) VALUES (?, ?)")
        .bind(trigger.as_str())
        .bind(params_json)
        .execute(pool)
        .await
        .context("Failed to create scraping task")?;
    Ok(result.last_insert_rowid())
}

/// Transition a task to running.
pub async fn mark_task_running(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE scraping_tasks SET status = ? WHERE id = ?")
        .bind(TaskStatus::Running.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark task running")?;
    Ok(())
}

/// Terminal update: completed with result counts.
pub async fn complete_task(
    pool: &SqlitePool,
    id: i64,
    total_articles: i64,
    total_fb_posts: i64,
    total_tweets: i64,
    total_flagged: i64,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE scraping_tasks
        SET status = ?, total_articles = ?, total_fb_posts = ?, total_tweets = ?,
            total_flagged = ?, finished_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(TaskStatus::Completed.as_str())
    .bind(total_articles)
    .bind(total_fb_posts)
    .bind(total_tweets)
    .bind(total_flagged)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to complete task")?;
    Ok(())
}

/// Terminal update: failed with an error message.
pub async fn fail_task(pool: &SqlitePool, id: i64, error_message: &str) -> Result<()> {
    sqlx::query(
        r"
        UPDATE scraping_tasks
        SET status = ?, error_message = ?, finished_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(TaskStatus::Failed.as_str())
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to fail task")?;
    Ok(())
}

/// Get a task record by id.
pub async fn get_task(pool: &SqlitePool, id: i64) -> Result<Option<ScrapingTask>> {
    sqlx::query_as("SELECT * FROM scraping_tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch task")
}

/// Task records ordered newest-first.
pub async fn list_tasks(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<ScrapingTask>> {
    sqlx::query_as("SELECT * FROM scraping_tasks ORDER BY id DESC LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list tasks")
}

// ========== Schedule ==========

/// Get the singleton schedule, if configured.
pub async fn get_schedule(pool: &SqlitePool) -> Result<Option<ScrapingSchedule>> {
    sqlx::query_as("SELECT * FROM scraping_schedule WHERE id = 1")
        .fetch_optional(pool)
        .await
        .context("Failed to fetch schedule")
}

/// Create or replace the singleton schedule.
pub async fn set_schedule(
    pool: &SqlitePool,
    enabled: bool,
    cadence: Cadence,
    window_days: i64,
    fb_limit: i64,
    tw_limit: i64,
    next_run_at: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO scraping_schedule (id, enabled, cadence, window_days, fb_limit, tw_limit, next_run_at)
        VALUES (1, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            enabled = excluded.enabled,
            cadence = excluded.cadence,
            window_days = excluded.window_days,
            fb_limit = excluded.fb_limit,
            tw_limit = excluded.tw_limit,
            next_run_at = excluded.next_run_at
        ",
    )
    .bind(enabled)
    .bind(cadence.as_str())
    .bind(window_days)
    .bind(fb_limit)
    .bind(tw_limit)
    .bind(next_run_at)
    .execute(pool)
    .await
    .context("Failed to set schedule")?;
    Ok(())
}

/// Remove the schedule entirely.
pub async fn clear_schedule(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM scraping_schedule WHERE id = 1")
        .execute(pool)
        .await
        .context("Failed to clear schedule")?;
    Ok(())
}

/// Advance the schedule after an automatic run. Last-write-wins; only the
/// schedule driver calls this.
pub async fn update_schedule_run(
    pool: &SqlitePool,
    last_run_at: &str,
    next_run_at: &str,
) -> Result<()> {
    sqlx::query("UPDATE scraping_schedule SET last_run_at = ?, next_run_at = ? WHERE id = 1")
        .bind(last_run_at)
        .bind(next_run_at)
        .execute(pool)
        .await
        .context("Failed to update schedule run timestamps")?;
    Ok(())
}

// ========== Audience aggregates ==========

/// Per-media web activity within a window. `days_since_last_pub` is 999 when
/// the media never published.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebActivityRow {
    pub media_id: i64,
    pub name: String,
    pub url: String,
    pub total_articles: i64,
    pub first_publication: Option<String>,
    pub last_publication: Option<String>,
    pub days_with_publication: i64,
    pub days_since_last_pub: i64,
}

/// Web (article) activity per active media, most prolific first.
pub async fn web_activity(pool: &SqlitePool, days: i64) -> Result<Vec<WebActivityRow>> {
    let now = format_timestamp(Utc::now());
    sqlx::query_as(
        r"
        SELECT
            m.id as media_id,
            m.name,
            m.url,
            COUNT(a.id) as total_articles,
            MIN(a.published_at) as first_publication,
            MAX(a.published_at) as last_publication,
            COUNT(DISTINCT DATE(a.published_at)) as days_with_publication,
            CAST(
                CASE
                    WHEN MAX(a.published_at) IS NULL THEN 999
                    ELSE CAST(julianday(?) - julianday(MAX(a.published_at)) AS INTEGER)
                END
            AS INTEGER) as days_since_last_pub
        FROM medias m
        LEFT JOIN articles a ON m.id = a.media_id AND a.published_at >= ?
        WHERE m.active = 1
        GROUP BY m.id, m.name, m.url
        ORDER BY total_articles DESC
        ",
    )
    .bind(&now)
    .bind(window_cutoff(days))
    .fetch_all(pool)
    .await
    .context("Failed to fetch web activity")
}

/// Per-media Facebook activity within a window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FacebookActivityRow {
    pub media_id: i64,
    pub name: String,
    pub url: String,
    pub facebook_page: String,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_shares: i64,
    pub total_engagement: i64,
    pub last_publication: Option<String>,
    pub days_with_publication: i64,
    pub days_since_last_pub: i64,
}

/// Facebook activity per active media with a configured page.
pub async fn facebook_activity(pool: &SqlitePool, days: i64) -> Result<Vec<FacebookActivityRow>> {
    let now = format_timestamp(Utc::now());
    sqlx::query_as(
        r"
        SELECT
            m.id as media_id,
            m.name,
            m.url,
            m.facebook_page,
            COUNT(fp.id) as total_posts,
            COALESCE(SUM(fp.likes), 0) as total_likes,
            COALESCE(SUM(fp.comments), 0) as total_comments,
            COALESCE(SUM(fp.shares), 0) as total_shares,
            COALESCE(SUM(fp.engagement), 0) as total_engagement,
            MAX(fp.published_at) as last_publication,
            COUNT(DISTINCT DATE(fp.published_at)) as days_with_publication,
            CAST(
                CASE
                    WHEN MAX(fp.published_at) IS NULL THEN 999
                    ELSE CAST(julianday(?) - julianday(MAX(fp.published_at)) AS INTEGER)
                END
            AS INTEGER) as days_since_last_pub
        FROM medias m
        LEFT JOIN facebook_posts fp ON m.id = fp.media_id AND fp.published_at >= ?
        WHERE m.active = 1 AND m.facebook_page IS NOT NULL
        GROUP BY m.id, m.name, m.url, m.facebook_page
        ORDER BY total_engagement DESC
        ",
    )
    .bind(&now)
    .bind(window_cutoff(days))
    .fetch_all(pool)
    .await
    .context("Failed to fetch facebook activity")
}

/// Per-media Twitter activity within a window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TwitterActivityRow {
    pub media_id: i64,
    pub name: String,
    pub url: String,
    pub twitter_account: String,
    pub total_tweets: i64,
    pub total_retweets: i64,
    pub total_replies: i64,
    pub total_likes: i64,
    pub total_quotes: i64,
    pub total_impressions: i64,
    pub total_engagement: i64,
    pub last_publication: Option<String>,
    pub days_with_publication: i64,
    pub days_since_last_pub: i64,
}

/// Twitter activity per active media with a configured account.
pub async fn twitter_activity(pool: &SqlitePool, days: i64) -> Result<Vec<TwitterActivityRow>> {
    let now = format_timestamp(Utc::now());
    sqlx::query_as(
        r"
        SELECT
            m.id as media_id,
            m.name,
            m.url,
            m.twitter_account,
            COUNT(tw.id) as total_tweets,
            COALESCE(SUM(tw.retweets), 0) as total_retweets,
            COALESCE(SUM(tw.replies), 0) as total_replies,
            COALESCE(SUM(tw.likes), 0) as total_likes,
            COALESCE(SUM(tw.quotes), 0) as total_quotes,
            COALESCE(SUM(tw.impressions), 0) as total_impressions,
            COALESCE(SUM(tw.engagement), 0) as total_engagement,
            MAX(tw.published_at) as last_publication,
            COUNT(DISTINCT DATE(tw.published_at)) as days_with_publication,
            CAST(
                CASE
                    WHEN MAX(tw.published_at) IS NULL THEN 999
                    ELSE CAST(julianday(?) - julianday(MAX(tw.published_at)) AS INTEGER)
                END
            AS INTEGER) as days_since_last_pub
        FROM medias m
        LEFT JOIN twitter_tweets tw ON m.id = tw.media_id AND tw.published_at >= ?
        WHERE m.active = 1 AND m.twitter_account IS NOT NULL
        GROUP BY m.id, m.name, m.url, m.twitter_account
        ORDER BY total_engagement DESC
        ",
    )
    .bind(&now)
    .bind(window_cutoff(days))
    .fetch_all(pool)
    .await
    .context("Failed to fetch twitter activity")
}

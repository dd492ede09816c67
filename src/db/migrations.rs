use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        debug!("Running migration v2");
        run_migration_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    if current_version < 3 {
        debug!("Running migration v3");
        run_migration_v3(pool).await?;
        set_schema_version(pool, 3).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: media, articles, logs, classifications");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS medias (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            site_kind TEXT NOT NULL DEFAULT 'unknown',
            facebook_page TEXT,
            twitter_account TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            last_scraped_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create medias table")?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER NOT NULL REFERENCES medias(id),
            url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            published_at TEXT,
            collected_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create articles table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_media ON articles(media_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_at)")
        .execute(pool)
        .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS scraping_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER NOT NULL REFERENCES medias(id),
            status TEXT NOT NULL,
            method TEXT NOT NULL,
            items_collected INTEGER NOT NULL DEFAULT 0,
            message TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create scraping_logs table")?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS classifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            article_id INTEGER NOT NULL UNIQUE REFERENCES articles(id),
            category TEXT NOT NULL,
            confidence REAL NOT NULL,
            keywords TEXT NOT NULL DEFAULT '[]',
            justification TEXT NOT NULL DEFAULT '',
            method TEXT NOT NULL,
            classified_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create classifications table")?;

    Ok(())
}

async fn run_migration_v2(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v2: social tables and moderation");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS facebook_posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER NOT NULL REFERENCES medias(id),
            post_id TEXT NOT NULL UNIQUE,
            message TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            published_at TEXT,
            likes INTEGER NOT NULL DEFAULT 0,
            comments INTEGER NOT NULL DEFAULT 0,
            shares INTEGER NOT NULL DEFAULT 0,
            engagement INTEGER NOT NULL DEFAULT 0,
            collected_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create facebook_posts table")?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS twitter_tweets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER NOT NULL REFERENCES medias(id),
            tweet_id TEXT NOT NULL UNIQUE,
            text TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            published_at TEXT,
            retweets INTEGER NOT NULL DEFAULT 0,
            replies INTEGER NOT NULL DEFAULT 0,
            likes INTEGER NOT NULL DEFAULT 0,
            quotes INTEGER NOT NULL DEFAULT 0,
            impressions INTEGER NOT NULL DEFAULT 0,
            engagement INTEGER NOT NULL DEFAULT 0,
            collected_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create twitter_tweets table")?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS content_moderation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_kind TEXT NOT NULL,
            content_id INTEGER NOT NULL,
            risk_score REAL NOT NULL,
            risk_level TEXT NOT NULL,
            toxic INTEGER NOT NULL DEFAULT 0,
            misinformation INTEGER NOT NULL DEFAULT 0,
            sensitive INTEGER NOT NULL DEFAULT 0,
            should_flag INTEGER NOT NULL DEFAULT 0,
            primary_issue TEXT NOT NULL DEFAULT '',
            scores TEXT NOT NULL DEFAULT '{}',
            analyzed_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(content_kind, content_id)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create content_moderation table")?;

    Ok(())
}

async fn run_migration_v3(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v3: tasks and schedule");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS scraping_tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trigger_kind TEXT NOT NULL,
            params TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'queued',
            total_articles INTEGER NOT NULL DEFAULT 0,
            total_fb_posts INTEGER NOT NULL DEFAULT 0,
            total_tweets INTEGER NOT NULL DEFAULT 0,
            total_flagged INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            finished_at TEXT
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create scraping_tasks table")?;

    // Singleton row, id fixed at 1.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS scraping_schedule (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            enabled INTEGER NOT NULL DEFAULT 0,
            cadence TEXT NOT NULL DEFAULT 'daily',
            window_days INTEGER NOT NULL DEFAULT 30,
            fb_limit INTEGER NOT NULL DEFAULT 5,
            tw_limit INTEGER NOT NULL DEFAULT 5,
            last_run_at TEXT,
            next_run_at TEXT
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create scraping_schedule table")?;

    Ok(())
}

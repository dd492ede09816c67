//! Per-source collection with RSS-to-HTML fallback.
//!
//! One collection pass tries the feed adapter first, falls back to front-page
//! scraping when the feed yields nothing, persists whatever survived URL
//! dedup, then classifies the new articles best-effort. Every pass writes
//! exactly one audit log row.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::classify::ThemeClassifier;
use crate::db::{self, Database, NewArticle, SiteKind};
use crate::fetch::{canonical_site_url, media_name_from_url, ArticleFetcher, FetchedArticle};

/// Which channel produced a collection outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMethod {
    Rss,
    Html,
    Error,
}

impl CollectMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::Html => "html",
            Self::Error => "error",
        }
    }
}

/// Result of one collection pass against one source.
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    pub media_id: i64,
    pub saved: usize,
    pub duplicates: usize,
    pub classified: usize,
    pub method: CollectMethod,
    pub message: String,
}

/// Orchestrates a single source: fetch with fallback, persist, classify.
pub struct SourceCollector {
    db: Database,
    rss: Arc<dyn ArticleFetcher>,
    html: Arc<dyn ArticleFetcher>,
    classifier: Option<ThemeClassifier>,
}

impl SourceCollector {
    #[must_use]
    pub fn new(
        db: Database,
        rss: Arc<dyn ArticleFetcher>,
        html: Arc<dyn ArticleFetcher>,
        classifier: Option<ThemeClassifier>,
    ) -> Self {
        Self {
            db,
            rss,
            html,
            classifier,
        }
    }

    /// Run one collection pass for a site URL.
    ///
    /// Adapter failures never escape: an RSS failure falls through to HTML,
    /// and an HTML failure ends the pass with an `error` outcome. Only
    /// storage problems propagate as `Err`.
    pub async fn collect(&self, site_url: &str, window_days: i64) -> Result<CollectOutcome> {
        let url = canonical_site_url(site_url);
        let name = media_name_from_url(&url);
        let pool = self.db.pool();

        // Feed first. An empty feed and a broken feed both fall through.
        let rss_items = match self.rss.fetch(&url, window_days).await {
            Ok(items) => items,
            Err(e) => {
                warn!(url = %url, "RSS fetch failed, falling back to HTML: {e}");
                Vec::new()
            }
        };

        let (items, method, site_kind) = if rss_items.is_empty() {
            match self.html.fetch(&url, window_days).await {
                Ok(items) => (items, CollectMethod::Html, SiteKind::Html),
                Err(e) => {
                    // The one fatal path: both channels exhausted.
                    let media_id = db::upsert_media(pool, &name, &url, SiteKind::Unknown.as_str())
                        .await?;
                    let message = format!("collection failed: {e}");
                    db::add_scraping_log(pool, media_id, "error", "html", 0, &message).await?;
                    warn!(url = %url, "Collection failed on both channels: {e}");
                    return Ok(CollectOutcome {
                        media_id,
                        saved: 0,
                        duplicates: 0,
                        classified: 0,
                        method: CollectMethod::Error,
                        message,
                    });
                }
            }
        } else {
            (rss_items, CollectMethod::Rss, SiteKind::Rss)
        };

        let media_id = db::upsert_media(pool, &name, &url, site_kind.as_str()).await?;

        let (saved, duplicates, new_ids) = self.persist(media_id, &items).await?;
        let classified = self.classify_new(&new_ids).await;

        db::update_media_last_scraped(pool, media_id).await?;

        let status = if saved > 0 { "success" } else { "partial" };
        let message = format!(
            "{saved} new article(s), {duplicates} duplicate(s) via {}",
            method.as_str()
        );
        db::add_scraping_log(pool, media_id, status, method.as_str(), saved as i64, &message)
            .await?;

        info!(
            url = %url,
            saved,
            duplicates,
            classified,
            method = method.as_str(),
            "Collection pass finished"
        );

        Ok(CollectOutcome {
            media_id,
            saved,
            duplicates,
            classified,
            method,
            message,
        })
    }

    /// Insert fetched articles, skipping URLs already stored. Returns the
    /// saved and duplicate counts plus the new row ids.
    async fn persist(
        &self,
        media_id: i64,
        items: &[FetchedArticle],
    ) -> Result<(usize, usize, Vec<i64>)> {
        let pool = self.db.pool();
        let mut saved = 0;
        let mut duplicates = 0;
        let mut new_ids = Vec::new();

        for item in items {
            if db::article_exists(pool, &item.url).await? {
                duplicates += 1;
                continue;
            }
            let id = db::insert_article(
                pool,
                &NewArticle {
                    media_id,
                    url: item.url.clone(),
                    title: item.title.clone(),
                    content: item.content.clone(),
                    image_url: item.image_url.clone(),
                    published_at: item.published_at.map(db::format_timestamp),
                },
            )
            .await?;
            new_ids.push(id);
            saved += 1;
        }

        Ok((saved, duplicates, new_ids))
    }

    /// Classify newly inserted articles. Best-effort: a classifier problem
    /// never fails the pass, the articles just stay unclassified.
    async fn classify_new(&self, article_ids: &[i64]) -> usize {
        let Some(classifier) = &self.classifier else {
            return 0;
        };

        let pool = self.db.pool();
        let mut classified = 0;
        for &id in article_ids {
            let article = match db::get_article(pool, id).await {
                Ok(Some(a)) => a,
                Ok(None) => continue,
                Err(e) => {
                    warn!(article_id = id, "Failed to load article for classification: {e}");
                    continue;
                }
            };

            let verdict = classifier.classify(&article.title, &article.content).await;
            let keywords_json =
                serde_json::to_string(&verdict.keywords).unwrap_or_else(|_| "[]".to_string());

            if let Err(e) = db::upsert_classification(
                pool,
                id,
                verdict.category.as_str(),
                verdict.confidence,
                &keywords_json,
                &verdict.justification,
                verdict.method.as_str(),
            )
            .await
            {
                warn!(article_id = id, "Failed to store classification: {e}");
                continue;
            }
            classified += 1;
        }
        classified
    }
}

//! Multi-source campaign: web collection across every active source, social
//! collection for sources with configured handles, then a bounded moderation
//! sweep and an influence ranking of the window.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::analytics::{self, MediaInfluence};
use crate::classify::ThemeClassifier;
use crate::config::Config;
use crate::db::{
    self, ContentKind, Database, Media, NewFacebookPost, NewModerationRecord, NewTwitterTweet,
};
use crate::fetch::{canonical_site_url, FacebookClient, HtmlFetcher, RssFetcher, TwitterClient};
use crate::moderation::ModerationClient;

use super::collector::{CollectMethod, SourceCollector};

/// How many ranked media the campaign summary carries.
const RANKING_TOP_N: usize = 5;

/// Which sources a campaign covers.
#[derive(Debug, Clone)]
pub enum CampaignScope {
    /// Every active media outlet, in stable name order.
    AllActive,
    /// A single site URL, registered on the fly if unknown.
    Single(String),
}

/// Per-run knobs, defaulted from configuration.
#[derive(Debug, Clone)]
pub struct CampaignOptions {
    pub window_days: i64,
    pub fb_limit: usize,
    pub tw_limit: usize,
    pub skip_facebook: bool,
    pub skip_twitter: bool,
}

impl CampaignOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            window_days: config.window_days,
            fb_limit: config.fb_post_limit,
            tw_limit: config.tweet_limit,
            skip_facebook: false,
            skip_twitter: false,
        }
    }
}

/// Web collection result for one source.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub url: String,
    pub saved: usize,
    pub method: CollectMethod,
    pub message: String,
}

/// How the moderation sweep ended.
#[derive(Debug, Clone)]
pub enum ModerationOutcome {
    /// Every eligible item within the budget was scored.
    Completed { analyzed: usize, flagged: usize },
    /// The oracle failed mid-sweep; already-scored items are kept.
    Aborted {
        analyzed: usize,
        flagged: usize,
        message: String,
    },
    /// No moderation oracle is configured.
    Skipped(String),
}

impl ModerationOutcome {
    #[must_use]
    pub fn flagged(&self) -> usize {
        match self {
            Self::Completed { flagged, .. } | Self::Aborted { flagged, .. } => *flagged,
            Self::Skipped(_) => 0,
        }
    }
}

/// Aggregate result of one campaign run.
#[derive(Debug, Clone)]
pub struct CampaignSummary {
    pub sources: Vec<SourceResult>,
    pub total_articles: usize,
    pub total_fb_posts: usize,
    pub total_tweets: usize,
    pub moderation: ModerationOutcome,
    pub top_media: Vec<MediaInfluence>,
}

impl CampaignSummary {
    #[must_use]
    pub fn total_flagged(&self) -> usize {
        self.moderation.flagged()
    }
}

/// Runs full campaigns: web, social, moderation, ranking.
pub struct CampaignRunner {
    db: Database,
    collector: SourceCollector,
    facebook: Option<FacebookClient>,
    twitter: Option<TwitterClient>,
    moderation: Option<ModerationClient>,
    moderation_max_items: i64,
}

impl CampaignRunner {
    #[must_use]
    pub fn new(
        db: Database,
        collector: SourceCollector,
        facebook: Option<FacebookClient>,
        twitter: Option<TwitterClient>,
        moderation: Option<ModerationClient>,
        moderation_max_items: i64,
    ) -> Self {
        Self {
            db,
            collector,
            facebook,
            twitter,
            moderation,
            moderation_max_items,
        }
    }

    /// Wire a runner from configuration: shared HTTP client, both web
    /// adapters, and whichever oracles and social clients are configured.
    /// Each configured client is probed once so startup logs say which
    /// backends are reachable; an unreachable backend stays configured and
    /// gets retried on use.
    pub async fn from_config(db: Database, config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("mediascan/0.1")
            .build()
            .unwrap_or_default();

        let classifier = config
            .auto_classify
            .then(|| ThemeClassifier::new(client.clone(), &config.ollama_url, &config.ollama_model));
        if let Some(classifier) = &classifier {
            if classifier.check_status().await {
                info!("Classification oracle reachable");
            } else {
                warn!(url = %config.ollama_url, "Classification oracle unreachable, keyword fallback will be used");
            }
        }

        let collector = SourceCollector::new(
            db.clone(),
            Arc::new(RssFetcher::new(client.clone())),
            Arc::new(HtmlFetcher::new(client.clone(), config.html_max_articles)),
            classifier,
        );

        let facebook = config
            .facebook_access_token
            .as_deref()
            .map(|token| FacebookClient::new(client.clone(), &config.facebook_api_url, token));
        let twitter = config
            .twitter_bearer_token
            .as_deref()
            .map(|token| TwitterClient::new(client.clone(), &config.twitter_api_url, token));
        let moderation = config
            .moderation_url
            .as_deref()
            .map(|url| ModerationClient::new(client, url));

        if let Some(fb) = &facebook {
            if fb.test_connection().await {
                info!("Facebook API reachable");
            } else {
                warn!(url = %config.facebook_api_url, "Facebook API connection check failed");
            }
        }
        if let Some(tw) = &twitter {
            if tw.test_connection().await {
                info!("Twitter API reachable");
            } else {
                warn!(url = %config.twitter_api_url, "Twitter API connection check failed");
            }
        }

        Self::new(
            db,
            collector,
            facebook,
            twitter,
            moderation,
            config.moderation_max_items,
        )
    }

    /// Run one campaign. A failing source never aborts the rest; only
    /// storage-level problems propagate.
    pub async fn run(
        &self,
        scope: &CampaignScope,
        options: &CampaignOptions,
    ) -> Result<CampaignSummary> {
        let pool = self.db.pool();

        let urls: Vec<String> = match scope {
            CampaignScope::AllActive => db::get_active_medias(pool)
                .await?
                .into_iter()
                .map(|m| m.url)
                .collect(),
            CampaignScope::Single(url) => vec![url.clone()],
        };

        info!(sources = urls.len(), window_days = options.window_days, "Campaign started");

        let mut sources = Vec::with_capacity(urls.len());
        let mut total_articles = 0;
        for url in urls {
            match self.collector.collect(&url, options.window_days).await {
                Ok(outcome) => {
                    total_articles += outcome.saved;
                    sources.push(SourceResult {
                        url,
                        saved: outcome.saved,
                        method: outcome.method,
                        message: outcome.message,
                    });
                }
                Err(e) => {
                    warn!(url = %url, "Source collection errored: {e:#}");
                    sources.push(SourceResult {
                        url,
                        saved: 0,
                        method: CollectMethod::Error,
                        message: format!("collection failed: {e}"),
                    });
                }
            }
        }

        // Social collection covers the same sources as web collection. A
        // single-URL campaign resolves to the one media the collector just
        // registered; everything else stays untouched.
        let social_targets: Vec<Media> = match scope {
            CampaignScope::AllActive => db::get_active_medias(pool).await?,
            CampaignScope::Single(url) => {
                db::get_media_by_url(pool, &canonical_site_url(url))
                    .await?
                    .into_iter()
                    .collect()
            }
        };

        let total_fb_posts = if options.skip_facebook {
            0
        } else {
            self.collect_facebook(&social_targets, options.fb_limit).await?
        };
        let total_tweets = if options.skip_twitter {
            0
        } else {
            self.collect_twitter(&social_targets, options.tw_limit).await?
        };

        let moderation = self.moderation_sweep(options.window_days).await?;

        let top_media = analytics::global_audience(&self.db, options.window_days)
            .await?
            .ranking
            .into_iter()
            .take(RANKING_TOP_N)
            .collect();

        info!(
            total_articles,
            total_fb_posts,
            total_tweets,
            flagged = moderation.flagged(),
            "Campaign finished"
        );

        Ok(CampaignSummary {
            sources,
            total_articles,
            total_fb_posts,
            total_tweets,
            moderation,
            top_media,
        })
    }

    /// Collect Facebook posts for the in-scope medias with a configured
    /// page. Returns the number of newly inserted posts.
    async fn collect_facebook(&self, medias: &[Media], limit: usize) -> Result<usize> {
        let Some(client) = &self.facebook else {
            return Ok(0);
        };

        let pool = self.db.pool();
        let mut inserted = 0;
        for media in medias {
            let Some(page) = media.facebook_page.as_deref() else {
                continue;
            };
            let posts = match client.fetch_posts(page, limit).await {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(media = %media.name, page = %page, "Facebook fetch failed: {e}");
                    continue;
                }
            };
            for post in posts {
                let new = db::upsert_facebook_post(
                    pool,
                    &NewFacebookPost {
                        media_id: media.id,
                        post_id: post.post_id,
                        message: post.message,
                        url: post.url,
                        image_url: post.image_url,
                        published_at: post.published_at.map(db::format_timestamp),
                        likes: post.likes,
                        comments: post.comments,
                        shares: post.shares,
                    },
                )
                .await?;
                if new {
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    /// Collect tweets for the in-scope medias with a configured account.
    /// Returns the number of newly inserted tweets.
    async fn collect_twitter(&self, medias: &[Media], limit: usize) -> Result<usize> {
        let Some(client) = &self.twitter else {
            return Ok(0);
        };

        let pool = self.db.pool();
        let mut inserted = 0;
        for media in medias {
            let Some(account) = media.twitter_account.as_deref() else {
                continue;
            };
            let tweets = match client.fetch_tweets(account, limit).await {
                Ok(tweets) => tweets,
                Err(e) => {
                    warn!(media = %media.name, account = %account, "Twitter fetch failed: {e}");
                    continue;
                }
            };
            for tweet in tweets {
                let new = db::upsert_twitter_tweet(
                    pool,
                    &NewTwitterTweet {
                        media_id: media.id,
                        tweet_id: tweet.tweet_id,
                        text: tweet.text,
                        url: tweet.url,
                        image_url: tweet.image_url,
                        published_at: tweet.published_at.map(db::format_timestamp),
                        retweets: tweet.retweets,
                        replies: tweet.replies,
                        likes: tweet.likes,
                        quotes: tweet.quotes,
                        impressions: tweet.impressions,
                    },
                )
                .await?;
                if new {
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    /// Score recent content that has no moderation record yet, up to the
    /// configured item budget across all content kinds.
    async fn moderation_sweep(&self, window_days: i64) -> Result<ModerationOutcome> {
        let Some(client) = &self.moderation else {
            return Ok(ModerationOutcome::Skipped(
                "moderation oracle not configured".to_string(),
            ));
        };

        let pool = self.db.pool();
        let budget = self.moderation_max_items;
        let mut analyzed: usize = 0;
        let mut flagged: usize = 0;

        let mut pending: Vec<(ContentKind, i64, String)> = Vec::new();
        for article in db::get_recent_articles(pool, window_days, budget).await? {
            let text = format!("{}\n\n{}", article.title, article.content);
            pending.push((ContentKind::Article, article.id, text));
        }
        for post in db::get_recent_facebook_posts(pool, window_days, budget).await? {
            pending.push((ContentKind::FacebookPost, post.id, post.message));
        }
        for tweet in db::get_recent_tweets(pool, window_days, budget).await? {
            pending.push((ContentKind::Tweet, tweet.id, tweet.text));
        }

        for (kind, content_id, text) in pending {
            if analyzed as i64 >= budget {
                break;
            }
            if text.trim().is_empty() {
                continue;
            }
            if db::moderation_exists(pool, kind, content_id).await? {
                continue;
            }

            let verdict = match client.assess(&text).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        kind = kind.as_str(),
                        content_id, "Moderation oracle failed, aborting sweep: {e:#}"
                    );
                    return Ok(ModerationOutcome::Aborted {
                        analyzed,
                        flagged,
                        message: format!("moderation sweep aborted: {e}"),
                    });
                }
            };

            db::upsert_moderation(
                pool,
                &NewModerationRecord {
                    content_kind: kind,
                    content_id,
                    risk_score: verdict.risk_score,
                    risk_level: verdict.risk_level.as_str().to_string(),
                    toxic: verdict.toxic,
                    misinformation: verdict.misinformation,
                    sensitive: verdict.sensitive,
                    should_flag: verdict.should_flag,
                    primary_issue: verdict.primary_issue.clone(),
                    scores: serde_json::to_string(&verdict.scores)
                        .unwrap_or_else(|_| "{}".to_string()),
                },
            )
            .await?;

            analyzed += 1;
            if verdict.should_flag {
                flagged += 1;
            }
        }

        Ok(ModerationOutcome::Completed { analyzed, flagged })
    }
}

//! Audience analytics over the collected window: per-channel activity
//! reports, an influence ranking that blends publication volume with social
//! engagement, and inactivity detection.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::db::{self, Database};

/// Sentinel for "never published" in activity aggregates.
pub const NEVER_PUBLISHED: i64 = 999;

/// Volume weight in the influence score.
const VOLUME_WEIGHT: f64 = 0.4;

/// Engagement weight in the influence score.
const ENGAGEMENT_WEIGHT: f64 = 0.6;

/// How recently a media outlet last published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Today,
    VeryActive,
    Active,
    Moderate,
    Occasional,
    Low,
    Inactive,
    Never,
}

impl ActivityStatus {
    /// Step function over days since the last publication.
    #[must_use]
    pub fn from_days_since(days: i64) -> Self {
        if days >= NEVER_PUBLISHED {
            Self::Never
        } else if days <= 0 {
            Self::Today
        } else if days <= 1 {
            Self::VeryActive
        } else if days <= 3 {
            Self::Active
        } else if days <= 7 {
            Self::Moderate
        } else if days <= 14 {
            Self::Occasional
        } else if days <= 30 {
            Self::Low
        } else {
            Self::Inactive
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::VeryActive => "very_active",
            Self::Active => "active",
            Self::Moderate => "moderate",
            Self::Occasional => "occasional",
            Self::Low => "low",
            Self::Inactive => "inactive",
            Self::Never => "never",
        }
    }
}

/// Blend of publication volume and engagement, normalized so that ten items
/// or one hundred interactions each saturate their component at 1.0.
#[must_use]
pub fn influence_score(volume: i64, engagement: i64) -> f64 {
    VOLUME_WEIGHT * (volume as f64 / 10.0) + ENGAGEMENT_WEIGHT * (engagement as f64 / 100.0)
}

/// Average guarded against an empty denominator.
fn per_unit(total: i64, units: i64) -> f64 {
    if units <= 0 {
        0.0
    } else {
        total as f64 / units as f64
    }
}

/// Web publication report for one media outlet.
#[derive(Debug, Clone, Serialize)]
pub struct WebAudienceEntry {
    pub media_id: i64,
    pub name: String,
    pub url: String,
    pub total_articles: i64,
    pub first_publication: Option<String>,
    pub last_publication: Option<String>,
    pub days_with_publication: i64,
    pub days_since_last_pub: i64,
    pub avg_articles_per_active_day: f64,
    pub activity: ActivityStatus,
}

/// Web activity per active media within the window, most prolific first.
pub async fn web_audience(db: &Database, days: i64) -> Result<Vec<WebAudienceEntry>> {
    let rows = db::web_activity(db.pool(), days).await?;
    Ok(rows
        .into_iter()
        .map(|r| WebAudienceEntry {
            avg_articles_per_active_day: per_unit(r.total_articles, r.days_with_publication),
            activity: ActivityStatus::from_days_since(r.days_since_last_pub),
            media_id: r.media_id,
            name: r.name,
            url: r.url,
            total_articles: r.total_articles,
            first_publication: r.first_publication,
            last_publication: r.last_publication,
            days_with_publication: r.days_with_publication,
            days_since_last_pub: r.days_since_last_pub,
        })
        .collect())
}

/// Facebook engagement report for one media outlet.
#[derive(Debug, Clone, Serialize)]
pub struct FacebookAudienceEntry {
    pub media_id: i64,
    pub name: String,
    pub facebook_page: String,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_shares: i64,
    pub total_engagement: i64,
    pub avg_engagement_per_post: f64,
    pub last_publication: Option<String>,
    pub days_since_last_pub: i64,
    pub activity: ActivityStatus,
}

/// Facebook activity per active media with a configured page.
pub async fn facebook_audience(db: &Database, days: i64) -> Result<Vec<FacebookAudienceEntry>> {
    let rows = db::facebook_activity(db.pool(), days).await?;
    Ok(rows
        .into_iter()
        .map(|r| FacebookAudienceEntry {
            avg_engagement_per_post: per_unit(r.total_engagement, r.total_posts),
            activity: ActivityStatus::from_days_since(r.days_since_last_pub),
            media_id: r.media_id,
            name: r.name,
            facebook_page: r.facebook_page,
            total_posts: r.total_posts,
            total_likes: r.total_likes,
            total_comments: r.total_comments,
            total_shares: r.total_shares,
            total_engagement: r.total_engagement,
            last_publication: r.last_publication,
            days_since_last_pub: r.days_since_last_pub,
        })
        .collect())
}

/// Twitter engagement report for one media outlet. Impressions are reported
/// but excluded from the engagement total.
#[derive(Debug, Clone, Serialize)]
pub struct TwitterAudienceEntry {
    pub media_id: i64,
    pub name: String,
    pub twitter_account: String,
    pub total_tweets: i64,
    pub total_retweets: i64,
    pub total_replies: i64,
    pub total_likes: i64,
    pub total_quotes: i64,
    pub total_impressions: i64,
    pub total_engagement: i64,
    pub avg_engagement_per_tweet: f64,
    pub last_publication: Option<String>,
    pub days_since_last_pub: i64,
    pub activity: ActivityStatus,
}

/// Twitter activity per active media with a configured account.
pub async fn twitter_audience(db: &Database, days: i64) -> Result<Vec<TwitterAudienceEntry>> {
    let rows = db::twitter_activity(db.pool(), days).await?;
    Ok(rows
        .into_iter()
        .map(|r| TwitterAudienceEntry {
            avg_engagement_per_tweet: per_unit(r.total_engagement, r.total_tweets),
            activity: ActivityStatus::from_days_since(r.days_since_last_pub),
            media_id: r.media_id,
            name: r.name,
            twitter_account: r.twitter_account,
            total_tweets: r.total_tweets,
            total_retweets: r.total_retweets,
            total_replies: r.total_replies,
            total_likes: r.total_likes,
            total_quotes: r.total_quotes,
            total_impressions: r.total_impressions,
            total_engagement: r.total_engagement,
            last_publication: r.last_publication,
            days_since_last_pub: r.days_since_last_pub,
        })
        .collect())
}

/// Cross-channel standing of one media outlet.
#[derive(Debug, Clone, Serialize)]
pub struct MediaInfluence {
    pub media_id: i64,
    pub name: String,
    pub url: String,
    pub articles: i64,
    pub fb_posts: i64,
    pub tweets: i64,
    pub volume: i64,
    pub engagement: i64,
    pub influence_score: f64,
    pub days_since_last_pub: i64,
    pub activity: ActivityStatus,
}

/// Cross-channel rollup of the window.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalAudience {
    pub window_days: i64,
    pub total_articles: i64,
    pub total_fb_posts: i64,
    pub total_tweets: i64,
    pub total_engagement: i64,
    /// Every active media, highest influence first.
    pub ranking: Vec<MediaInfluence>,
}

/// Combine the three channel aggregates into one influence ranking. Volume
/// counts items on every channel; engagement counts social interactions.
pub async fn global_audience(db: &Database, days: i64) -> Result<GlobalAudience> {
    let web = db::web_activity(db.pool(), days).await?;
    let facebook = db::facebook_activity(db.pool(), days).await?;
    let twitter = db::twitter_activity(db.pool(), days).await?;

    // Every active media has a web row; social rows only exist for medias
    // with a configured handle.
    let mut by_media: BTreeMap<i64, MediaInfluence> = web
        .into_iter()
        .map(|r| {
            (
                r.media_id,
                MediaInfluence {
                    media_id: r.media_id,
                    name: r.name,
                    url: r.url,
                    articles: r.total_articles,
                    fb_posts: 0,
                    tweets: 0,
                    volume: r.total_articles,
                    engagement: 0,
                    influence_score: 0.0,
                    days_since_last_pub: r.days_since_last_pub,
                    activity: ActivityStatus::Never,
                },
            )
        })
        .collect();

    for r in facebook {
        if let Some(entry) = by_media.get_mut(&r.media_id) {
            entry.fb_posts = r.total_posts;
            entry.volume += r.total_posts;
            entry.engagement += r.total_engagement;
            entry.days_since_last_pub = entry.days_since_last_pub.min(r.days_since_last_pub);
        }
    }
    for r in twitter {
        if let Some(entry) = by_media.get_mut(&r.media_id) {
            entry.tweets = r.total_tweets;
            entry.volume += r.total_tweets;
            entry.engagement += r.total_engagement;
            entry.days_since_last_pub = entry.days_since_last_pub.min(r.days_since_last_pub);
        }
    }

    let mut ranking: Vec<MediaInfluence> = by_media
        .into_values()
        .map(|mut entry| {
            entry.influence_score = influence_score(entry.volume, entry.engagement);
            entry.activity = ActivityStatus::from_days_since(entry.days_since_last_pub);
            entry
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.influence_score
            .partial_cmp(&a.influence_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    let total_articles = ranking.iter().map(|m| m.articles).sum();
    let total_fb_posts = ranking.iter().map(|m| m.fb_posts).sum();
    let total_tweets = ranking.iter().map(|m| m.tweets).sum();
    let total_engagement = ranking.iter().map(|m| m.engagement).sum();

    Ok(GlobalAudience {
        window_days: days,
        total_articles,
        total_fb_posts,
        total_tweets,
        total_engagement,
        ranking,
    })
}

/// Active medias whose last web publication is more than `threshold_days`
/// old (including those that never published).
pub async fn inactive_medias(
    db: &Database,
    days: i64,
    threshold_days: i64,
) -> Result<Vec<WebAudienceEntry>> {
    let mut entries = web_audience(db, days).await?;
    entries.retain(|e| e.days_since_last_pub > threshold_days);
    entries.sort_by(|a, b| b.days_since_last_pub.cmp(&a.days_since_last_pub));
    Ok(entries)
}

/// Facebook pages quiet for more than `threshold_days`.
pub async fn inactive_facebook_pages(
    db: &Database,
    days: i64,
    threshold_days: i64,
) -> Result<Vec<FacebookAudienceEntry>> {
    let mut entries = facebook_audience(db, days).await?;
    entries.retain(|e| e.days_since_last_pub > threshold_days);
    entries.sort_by(|a, b| b.days_since_last_pub.cmp(&a.days_since_last_pub));
    Ok(entries)
}

/// Twitter accounts quiet for more than `threshold_days`.
pub async fn inactive_twitter_accounts(
    db: &Database,
    days: i64,
    threshold_days: i64,
) -> Result<Vec<TwitterAudienceEntry>> {
    let mut entries = twitter_audience(db, days).await?;
    entries.retain(|e| e.days_since_last_pub > threshold_days);
    entries.sort_by(|a, b| b.days_since_last_pub.cmp(&a.days_since_last_pub));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_status_steps() {
        assert_eq!(ActivityStatus::from_days_since(0), ActivityStatus::Today);
        assert_eq!(ActivityStatus::from_days_since(1), ActivityStatus::VeryActive);
        assert_eq!(ActivityStatus::from_days_since(3), ActivityStatus::Active);
        assert_eq!(ActivityStatus::from_days_since(5), ActivityStatus::Moderate);
        assert_eq!(ActivityStatus::from_days_since(10), ActivityStatus::Occasional);
        assert_eq!(ActivityStatus::from_days_since(30), ActivityStatus::Low);
        assert_eq!(ActivityStatus::from_days_since(120), ActivityStatus::Inactive);
        assert_eq!(ActivityStatus::from_days_since(999), ActivityStatus::Never);
    }

    #[test]
    fn test_influence_score_weights() {
        // 10 items and 100 interactions each saturate their component.
        assert!((influence_score(10, 0) - 0.4).abs() < f64::EPSILON);
        assert!((influence_score(0, 100) - 0.6).abs() < f64::EPSILON);
        assert!((influence_score(10, 100) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_influence_score_monotonic() {
        assert!(influence_score(5, 50) < influence_score(6, 50));
        assert!(influence_score(5, 50) < influence_score(5, 60));
        assert!((influence_score(0, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_unit_guards_zero() {
        assert!((per_unit(10, 0)).abs() < f64::EPSILON);
        assert!((per_unit(10, 4) - 2.5).abs() < f64::EPSILON);
    }
}

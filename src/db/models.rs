use serde::{Deserialize, Serialize};

/// A monitored media outlet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub site_kind: String,
    pub facebook_page: Option<String>,
    pub twitter_account: Option<String>,
    pub active: bool,
    pub last_scraped_at: Option<String>,
    pub created_at: String,
}

impl Media {
    #[must_use]
    pub fn site_kind_enum(&self) -> Option<SiteKind> {
        SiteKind::from_str(&self.site_kind)
    }
}

/// How a media outlet's website is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Rss,
    Html,
    Unknown,
}

impl SiteKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::Html => "html",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "rss" => Some(Self::Rss),
            "html" => Some(Self::Html),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// A collected news article.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub media_id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub collected_at: String,
}

/// Data for inserting a new article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub media_id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

/// A collected Facebook post with engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FacebookPost {
    pub id: i64,
    pub media_id: i64,
    pub post_id: String,
    pub message: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub engagement: i64,
    pub collected_at: String,
}

/// Data for upserting a Facebook post.
#[derive(Debug, Clone)]
pub struct NewFacebookPost {
    pub media_id: i64,
    pub post_id: String,
    pub message: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

impl NewFacebookPost {
    /// Engagement is the sum of the raw counters.
    #[must_use]
    pub fn engagement(&self) -> i64 {
        self.likes + self.comments + self.shares
    }
}

/// A collected tweet with engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TwitterTweet {
    pub id: i64,
    pub media_id: i64,
    pub tweet_id: String,
    pub text: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub retweets: i64,
    pub replies: i64,
    pub likes: i64,
    pub quotes: i64,
    pub impressions: i64,
    pub engagement: i64,
    pub collected_at: String,
}

/// Data for upserting a tweet.
#[derive(Debug, Clone)]
pub struct NewTwitterTweet {
    pub media_id: i64,
    pub tweet_id: String,
    pub text: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub retweets: i64,
    pub replies: i64,
    pub likes: i64,
    pub quotes: i64,
    pub impressions: i64,
}

impl NewTwitterTweet {
    /// Engagement excludes impressions, which are reach rather than
    /// interaction.
    #[must_use]
    pub fn engagement(&self) -> i64 {
        self.retweets + self.replies + self.likes + self.quotes
    }
}

/// The latest classification attached to an article.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClassificationRecord {
    pub id: i64,
    pub article_id: i64,
    pub category: String,
    pub confidence: f64,
    pub keywords: String,
    pub justification: String,
    pub method: String,
    pub classified_at: String,
}

/// Kind of content a moderation record is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Article,
    FacebookPost,
    Tweet,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::FacebookPost => "facebook_post",
            Self::Tweet => "tweet",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "article" => Some(Self::Article),
            "facebook_post" => Some(Self::FacebookPost),
            "tweet" => Some(Self::Tweet),
            _ => None,
        }
    }
}

/// Moderation verdict stored per (content kind, content id).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModerationRecord {
    pub id: i64,
    pub content_kind: String,
    pub content_id: i64,
    pub risk_score: f64,
    pub risk_level: String,
    pub toxic: bool,
    pub misinformation: bool,
    pub sensitive: bool,
    pub should_flag: bool,
    pub primary_issue: String,
    pub scores: String,
    pub analyzed_at: String,
}

/// Data for upserting a moderation record.
#[derive(Debug, Clone)]
pub struct NewModerationRecord {
    pub content_kind: ContentKind,
    pub content_id: i64,
    pub risk_score: f64,
    pub risk_level: String,
    pub toxic: bool,
    pub misinformation: bool,
    pub sensitive: bool,
    pub should_flag: bool,
    pub primary_issue: String,
    pub scores: String,
}

/// Audit row for one collection attempt against one source.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScrapingLog {
    pub id: i64,
    pub media_id: i64,
    pub status: String,
    pub method: String,
    pub items_collected: i64,
    pub message: String,
    pub created_at: String,
}

/// Status of a scraping task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// What started a scraping task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Manual,
    Automatic,
}

impl TriggerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

/// Audit record of one orchestrated campaign run.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScrapingTask {
    pub id: i64,
    pub trigger_kind: String,
    pub params: String,
    pub status: String,
    pub total_articles: i64,
    pub total_fb_posts: i64,
    pub total_tweets: i64,
    pub total_flagged: i64,
    pub error_message: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl ScrapingTask {
    #[must_use]
    pub fn status_enum(&self) -> Option<TaskStatus> {
        TaskStatus::from_str(&self.status)
    }
}

/// Automatic collection cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    Daily,
    Weekly,
}

impl Cadence {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    /// Interval between runs.
    #[must_use]
    pub fn interval(&self) -> chrono::Duration {
        match self {
            Self::Hourly => chrono::Duration::hours(1),
            Self::Daily => chrono::Duration::days(1),
            Self::Weekly => chrono::Duration::days(7),
        }
    }
}

/// The singleton automatic collection schedule.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScrapingSchedule {
    pub id: i64,
    pub enabled: bool,
    pub cadence: String,
    pub window_days: i64,
    pub fb_limit: i64,
    pub tw_limit: i64,
    pub last_run_at: Option<String>,
    pub next_run_at: Option<String>,
}

impl ScrapingSchedule {
    #[must_use]
    pub fn cadence_enum(&self) -> Option<Cadence> {
        Cadence::from_str(&self.cadence)
    }
}

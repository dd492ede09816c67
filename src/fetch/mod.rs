//! Channel adapters: RSS, HTML, Facebook Graph API, Twitter API v2.
//!
//! Every adapter returns a list of normalized items on success and a
//! [`FetchError`] on unreachability/auth failure. "No content found" is an
//! empty list, never an error.

pub mod facebook;
pub mod html;
pub mod rss;
pub mod twitter;

pub use facebook::FacebookClient;
pub use html::HtmlFetcher;
pub use rss::RssFetcher;
pub use twitter::TwitterClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why an adapter call failed. Distinguishable so the orchestrator can tell
/// a dead endpoint from an authentication problem or a malformed payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected HTTP status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Unreachable(e.to_string())
    }
}

/// A normalized article produced by a web adapter.
#[derive(Debug, Clone)]
pub struct FetchedArticle {
    pub url: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Seam between the source orchestrator and the web channels, so collection
/// logic can be exercised against scripted fetchers.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetch articles published within the last `window_days` days.
    async fn fetch(
        &self,
        site_url: &str,
        window_days: i64,
    ) -> Result<Vec<FetchedArticle>, FetchError>;
}

/// Derive a display name for a media outlet from its canonical URL
/// ("https://www.example.com" -> "Example").
#[must_use]
pub fn media_name_from_url(site_url: &str) -> String {
    let domain = url::Url::parse(site_url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_else(|| site_url.to_string());

    let stripped = domain.strip_prefix("www.").unwrap_or(&domain);
    let base = stripped.split('.').next().unwrap_or(stripped);

    let mut chars = base.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Trim trailing slashes and whitespace from a user-supplied site URL.
#[must_use]
pub fn canonical_site_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

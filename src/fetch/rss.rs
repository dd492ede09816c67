use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use super::{ArticleFetcher, FetchError, FetchedArticle};

/// Feed paths probed in order when the site URL itself is not a feed.
const FEED_PATHS: &[&str] = &["/feed", "/rss", "/feed.xml", "/rss.xml", "/?feed=rss2"];

/// RSS/Atom adapter. Probes the site URL and common feed locations, parses
/// the first feed found, and keeps entries inside the lookback window.
#[derive(Debug, Clone)]
pub struct RssFetcher {
    client: reqwest::Client,
}

impl RssFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Try one candidate URL; `None` when it is not a parseable feed.
    async fn try_feed(&self, url: &str) -> Option<feed_rs::model::Feed> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %url, "Feed candidate fetch failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Feed candidate rejected");
            return None;
        }

        let body = response.bytes().await.ok()?;
        match feed_rs::parser::parse(&body[..]) {
            Ok(feed) => Some(feed),
            Err(e) => {
                debug!(url = %url, "Feed candidate did not parse: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl ArticleFetcher for RssFetcher {
    async fn fetch(
        &self,
        site_url: &str,
        window_days: i64,
    ) -> Result<Vec<FetchedArticle>, FetchError> {
        let base = site_url.trim_end_matches('/');

        let mut candidates = vec![base.to_string()];
        for path in FEED_PATHS {
            candidates.push(format!("{base}{path}"));
        }

        let mut feed = None;
        for candidate in &candidates {
            if let Some(parsed) = self.try_feed(candidate).await {
                debug!(url = %candidate, entries = parsed.entries.len(), "Found feed");
                feed = Some(parsed);
                break;
            }
        }

        // No feed anywhere: legitimate "nothing found", the caller falls back
        // to HTML scraping.
        let Some(feed) = feed else {
            return Ok(Vec::new());
        };

        let cutoff = Utc::now() - Duration::days(window_days);
        let mut articles = Vec::new();

        for entry in feed.entries {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            if url.is_empty() {
                continue;
            }

            let published_at = entry.published.or(entry.updated);
            if let Some(date) = published_at {
                if date < cutoff {
                    continue;
                }
            }

            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default();

            let content = entry
                .content
                .as_ref()
                .and_then(|c| c.body.clone())
                .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
                .map(|html| strip_tags(&html))
                .unwrap_or_default();

            let image_url = entry.media.first().and_then(|m| {
                m.content
                    .first()
                    .and_then(|c| c.url.as_ref().map(ToString::to_string))
            });

            articles.push(FetchedArticle {
                url,
                title,
                content,
                image_url,
                published_at,
            });
        }

        Ok(articles)
    }
}

/// Strip HTML tags from feed-supplied body text.
fn strip_tags(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Hello <b>world</b></p>\n<p>again</p>"),
            "Hello world again"
        );
        assert_eq!(strip_tags("no markup"), "no markup");
    }
}

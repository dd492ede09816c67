use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::{ArticleFetcher, FetchError, FetchedArticle};

/// Selectors tried in order when hunting for article links on a front page.
const LINK_SELECTORS: &[&str] = &[
    "article h2 a",
    "article h3 a",
    ".entry-title a",
    ".post-title a",
    "h2 a",
    "h3 a",
];

/// Maximum paragraphs of body text kept per article page.
const MAX_PARAGRAPHS: usize = 20;

/// HTML fallback adapter: scrapes the front page for article links, then
/// each article page for title, body text and metadata. Bounded by
/// `max_articles` so a misbehaving site cannot trigger runaway scraping.
#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    client: reqwest::Client,
    max_articles: usize,
}

impl HtmlFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client, max_articles: usize) -> Self {
        Self {
            client,
            max_articles,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: format!("GET {url}"),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ArticleFetcher for HtmlFetcher {
    async fn fetch(
        &self,
        site_url: &str,
        window_days: i64,
    ) -> Result<Vec<FetchedArticle>, FetchError> {
        // The front page is the one fatal dependency of HTML collection.
        let front_page = self.fetch_page(site_url).await?;
        let links = extract_article_links(&front_page, site_url, self.max_articles);

        debug!(site = %site_url, candidates = links.len(), "Extracted article links");

        let cutoff = Utc::now() - Duration::days(window_days);
        let mut articles = Vec::new();

        for link in links {
            // Individual article pages are best-effort.
            let page = match self.fetch_page(&link).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(url = %link, "Failed to fetch article page: {e}");
                    continue;
                }
            };

            let article = parse_article_page(&page, &link);
            if let Some(date) = article.published_at {
                if date < cutoff {
                    continue;
                }
            }
            if article.title.is_empty() {
                continue;
            }

            articles.push(article);
        }

        Ok(articles)
    }
}

/// Pull candidate article URLs off a front page, same-domain only, capped.
fn extract_article_links(html: &str, site_url: &str, max: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(base) = Url::parse(site_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for selector_str in LINK_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(resolved) = base.join(href) else {
                continue;
            };
            if resolved.host_str() != base.host_str() {
                continue;
            }

            let mut clean = resolved;
            clean.set_fragment(None);
            let url = clean.to_string();

            if url.trim_end_matches('/') == site_url.trim_end_matches('/') {
                continue;
            }
            if seen.insert(url.clone()) {
                links.push(url);
            }
            if links.len() >= max {
                return links;
            }
        }
    }

    links
}

/// Extract title, body text and metadata from one article page.
fn parse_article_page(html: &str, url: &str) -> FetchedArticle {
    let document = Html::parse_document(html);

    let title = meta_content(&document, "meta[property=\"og:title\"]")
        .or_else(|| {
            Selector::parse("h1").ok().and_then(|s| {
                document
                    .select(&s)
                    .next()
                    .map(|e| e.text().collect::<String>().trim().to_string())
            })
        })
        .or_else(|| {
            Selector::parse("title").ok().and_then(|s| {
                document
                    .select(&s)
                    .next()
                    .map(|e| e.text().collect::<String>().trim().to_string())
            })
        })
        .unwrap_or_default();

    let content = Selector::parse("p").ok().map_or_else(String::new, |s| {
        document
            .select(&s)
            .take(MAX_PARAGRAPHS)
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    });

    let image_url = meta_content(&document, "meta[property=\"og:image\"]");

    let published_at = meta_content(&document, "meta[property=\"article:published_time\"]")
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    FetchedArticle {
        url: url.to_string(),
        title,
        content,
        image_url,
        published_at,
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONT_PAGE: &str = r#"
        <html><body>
            <article><h2><a href="/news/first">First story</a></h2></article>
            <article><h2><a href="/news/second">Second story</a></h2></article>
            <article><h2><a href="https://other.example.org/external">External</a></h2></article>
            <h3><a href="/news/first#comments">First again</a></h3>
        </body></html>
    "#;

    #[test]
    fn test_extract_article_links_same_domain_deduped() {
        let links = extract_article_links(FRONT_PAGE, "https://news.example.com", 100);
        assert_eq!(
            links,
            vec![
                "https://news.example.com/news/first".to_string(),
                "https://news.example.com/news/second".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_article_links_caps_count() {
        let links = extract_article_links(FRONT_PAGE, "https://news.example.com", 1);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_parse_article_page() {
        let page = r#"
            <html><head>
                <title>Fallback title</title>
                <meta property="og:title" content="Budget adopted" />
                <meta property="og:image" content="https://cdn.example.com/img.jpg" />
                <meta property="article:published_time" content="2024-03-01T10:00:00+00:00" />
            </head><body>
                <h1>Budget adopted</h1>
                <p>First paragraph.</p>
                <p>Second paragraph.</p>
            </body></html>
        "#;
        let article = parse_article_page(page, "https://news.example.com/news/budget");
        assert_eq!(article.title, "Budget adopted");
        assert!(article.content.contains("First paragraph."));
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://cdn.example.com/img.jpg")
        );
        assert!(article.published_at.is_some());
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::FetchError;

/// A normalized tweet with raw engagement counters. Impressions are tracked
/// separately from the interaction counters.
#[derive(Debug, Clone)]
pub struct FetchedTweet {
    pub tweet_id: String,
    pub text: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub retweets: i64,
    pub replies: i64,
    pub likes: i64,
    pub quotes: i64,
    pub impressions: i64,
}

/// Twitter/X API v2 client (user timeline with public metrics).
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TweetsResponse {
    #[serde(default)]
    data: Vec<TweetData>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
    #[serde(default)]
    attachments: Option<Attachments>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    retweet_count: i64,
    #[serde(default)]
    reply_count: i64,
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    quote_count: i64,
    #[serde(default)]
    impression_count: i64,
}

#[derive(Debug, Deserialize)]
struct Attachments {
    #[serde(default)]
    media_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    media: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    media_key: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    preview_image_url: Option<String>,
}

impl TwitterClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, bearer_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        }
    }

    fn authed(&self, url: String) -> reqwest::RequestBuilder {
        self.client.get(url).bearer_auth(&self.bearer_token)
    }

    /// Probe the API with the configured token.
    pub async fn test_connection(&self) -> bool {
        let result = self
            .authed(format!("{}/users/by/username/Twitter", self.base_url))
            .send()
            .await;
        matches!(result, Ok(r) if r.status().is_success())
    }

    /// Resolve a username (with or without a leading `@`) to its user id.
    async fn resolve_user_id(&self, username: &str) -> Result<String, FetchError> {
        let username = username.trim_start_matches('@');
        let response = self
            .authed(format!("{}/users/by/username/{username}", self.base_url))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!(
                "Twitter API rejected token for '@{username}'"
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: format!("resolving user '@{username}'"),
            });
        }

        let payload: UserResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        payload
            .data
            .map(|d| d.id)
            .ok_or_else(|| FetchError::Parse(format!("user '@{username}' has no id")))
    }

    /// Fetch up to `limit` recent tweets for a username. The API requires
    /// `max_results` in 5..=100.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport, auth or payload problems. An
    /// account with no tweets yields an empty list.
    pub async fn fetch_tweets(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<FetchedTweet>, FetchError> {
        let user_id = self.resolve_user_id(username).await?;
        debug!(user = %username, id = %user_id, "Resolved Twitter user");

        let max_results = limit.clamp(5, 100);
        let response = self
            .authed(format!("{}/users/{user_id}/tweets", self.base_url))
            .query(&[
                ("max_results", max_results.to_string().as_str()),
                ("tweet.fields", "id,text,created_at,public_metrics,attachments"),
                ("expansions", "attachments.media_keys"),
                ("media.fields", "url,preview_image_url"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: format!("fetching tweets for '@{username}'"),
            });
        }

        let payload: TweetsResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let media_urls: HashMap<String, String> = payload
            .includes
            .map(|inc| {
                inc.media
                    .into_iter()
                    .filter_map(|m| {
                        let url = m.url.or(m.preview_image_url)?;
                        Some((m.media_key, url))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let tweets = payload
            .data
            .into_iter()
            .take(limit)
            .map(|tweet| {
                let metrics = tweet.public_metrics.unwrap_or_default();
                let image_url = tweet
                    .attachments
                    .as_ref()
                    .and_then(|a| a.media_keys.first())
                    .and_then(|key| media_urls.get(key))
                    .cloned();

                FetchedTweet {
                    url: format!("https://twitter.com/i/web/status/{}", tweet.id),
                    tweet_id: tweet.id,
                    text: tweet.text,
                    image_url,
                    published_at: tweet
                        .created_at
                        .as_deref()
                        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                    retweets: metrics.retweet_count,
                    replies: metrics.reply_count,
                    likes: metrics.like_count,
                    quotes: metrics.quote_count,
                    impressions: metrics.impression_count,
                }
            })
            .collect();

        Ok(tweets)
    }
}

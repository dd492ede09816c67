use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::FetchError;

/// A normalized Facebook post with raw engagement counters.
#[derive(Debug, Clone)]
pub struct FetchedFacebookPost {
    pub post_id: String,
    pub message: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

/// Facebook Graph API client (page posts with reaction/comment/share
/// summaries).
#[derive(Debug, Clone)]
pub struct FacebookClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    data: Vec<GraphPost>,
}

#[derive(Debug, Deserialize)]
struct GraphPost {
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    permalink_url: Option<String>,
    #[serde(default)]
    full_picture: Option<String>,
    #[serde(default)]
    reactions: Option<SummaryField>,
    #[serde(default)]
    comments: Option<SummaryField>,
    #[serde(default)]
    shares: Option<SharesField>,
}

#[derive(Debug, Deserialize)]
struct SummaryField {
    summary: Option<SummaryCount>,
}

#[derive(Debug, Deserialize)]
struct SummaryCount {
    #[serde(default)]
    total_count: i64,
}

#[derive(Debug, Deserialize)]
struct SharesField {
    #[serde(default)]
    count: i64,
}

impl FacebookClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, access_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Probe the API with the configured token.
    pub async fn test_connection(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/me", self.base_url))
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await;
        matches!(result, Ok(r) if r.status().is_success())
    }

    /// Resolve a page handle to its numeric id.
    async fn resolve_page_id(&self, page_handle: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(format!("{}/{page_handle}", self.base_url))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("fields", "id,name"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!(
                "Graph API rejected token for page '{page_handle}'"
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: format!("resolving page '{page_handle}'"),
            });
        }

        let page: PageResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        page.id
            .ok_or_else(|| FetchError::Parse(format!("page '{page_handle}' has no id")))
    }

    /// Fetch up to `limit` recent posts for a page handle.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport, auth or payload problems. An
    /// account with no posts yields an empty list.
    pub async fn fetch_posts(
        &self,
        page_handle: &str,
        limit: usize,
    ) -> Result<Vec<FetchedFacebookPost>, FetchError> {
        let page_id = self.resolve_page_id(page_handle).await?;
        debug!(page = %page_handle, id = %page_id, "Resolved Facebook page");

        let response = self
            .client
            .get(format!("{}/{page_id}/posts", self.base_url))
            .query(&[
                ("access_token", self.access_token.as_str()),
                (
                    "fields",
                    "id,message,created_time,permalink_url,full_picture,\
                     reactions.summary(true),comments.summary(true),shares",
                ),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: format!("fetching posts for page '{page_handle}'"),
            });
        }

        let payload: PostsResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let posts = payload
            .data
            .into_iter()
            .filter_map(|post| {
                let post_id = post.id?;
                let likes = post
                    .reactions
                    .and_then(|r| r.summary)
                    .map_or(0, |s| s.total_count);
                let comments = post
                    .comments
                    .and_then(|c| c.summary)
                    .map_or(0, |s| s.total_count);
                let shares = post.shares.map_or(0, |s| s.count);

                Some(FetchedFacebookPost {
                    post_id,
                    message: post.message.unwrap_or_default(),
                    url: post.permalink_url.unwrap_or_default(),
                    image_url: post.full_picture,
                    published_at: post
                        .created_time
                        .as_deref()
                        .and_then(parse_graph_timestamp),
                    likes,
                    comments,
                    shares,
                })
            })
            .collect();

        Ok(posts)
    }
}

/// Graph API timestamps are RFC3339 with a `+0000`-style offset.
fn parse_graph_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

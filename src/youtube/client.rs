// src/youtube/client.rs
//! YouTube Data API v3 client (search.list, videos.list, commentThreads.list).

use std::time::Duration;

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{SearchHit, UpstreamError, VideoPlatform, VideoStatistics};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sov-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        counter!("sov_upstream_requests_total", "endpoint" => endpoint).increment(1);
        let url = format!("{}/{}", self.base_url, endpoint);

        let result: Result<T, UpstreamError> = async {
            let resp = self
                .http
                .get(&url)
                .query(params)
                .query(&[("key", self.api_key.as_str())])
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(UpstreamError::from_status(status.as_u16(), &body));
            }
            resp.json::<T>().await.map_err(UpstreamError::from)
        }
        .await;

        if let Err(e) = &result {
            counter!("sov_upstream_errors_total", "kind" => e.kind()).increment(1);
            tracing::debug!(endpoint, error = %e, "upstream call failed");
        }
        result
    }
}

#[async_trait::async_trait]
impl VideoPlatform for YouTubeClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, UpstreamError> {
        let max = max_results.to_string();
        let resp: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("q", query),
                    ("maxResults", max.as_str()),
                ],
            )
            .await?;
        Ok(hits_from(resp))
    }

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics, UpstreamError> {
        let resp: VideosResponse = self
            .get_json("videos", &[("part", "statistics"), ("id", video_id)])
            .await?;
        Ok(stats_from(resp))
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, UpstreamError> {
        let max = max_results.to_string();
        let resp: CommentThreadsResponse = self
            .get_json(
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video_id),
                    ("maxResults", max.as_str()),
                    ("textFormat", "plainText"),
                ],
            )
            .await?;
        Ok(comments_from(resp))
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

// ---- wire format ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    statistics: Statistics,
}

// Counters are decimal strings; likeCount is absent when the owner hides likes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
}

/// Search snippets arrive HTML-escaped (`&#39;`, `&amp;`).
fn unescape(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

fn hits_from(resp: SearchResponse) -> Vec<SearchHit> {
    resp.items
        .into_iter()
        .filter_map(|it| {
            let video_id = it.id.video_id?;
            Some(SearchHit {
                video_id,
                title: unescape(&it.snippet.title),
                description: unescape(&it.snippet.description),
                channel_title: unescape(&it.snippet.channel_title),
            })
        })
        .collect()
}

fn parse_count(v: Option<&str>) -> u64 {
    v.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

fn stats_from(resp: VideosResponse) -> VideoStatistics {
    resp.items
        .into_iter()
        .next()
        .map(|it| VideoStatistics {
            views: parse_count(it.statistics.view_count.as_deref()),
            likes: parse_count(it.statistics.like_count.as_deref()),
        })
        .unwrap_or_default()
}

fn comments_from(resp: CommentThreadsResponse) -> Vec<String> {
    resp.items
        .into_iter()
        .map(|t| t.snippet.top_level_comment.snippet.text_display)
        .collect()
}

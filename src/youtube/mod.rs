// src/youtube/mod.rs
pub mod client;
pub mod error;

pub use client::YouTubeClient;
pub use error::UpstreamError;

use metrics::counter;
use serde::{Deserialize, Serialize};

/// Hard page-size limit of the platform's list endpoints.
pub const MAX_PAGE_SIZE: u32 = 50;

/// One search hit, before statistics are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoStatistics {
    pub views: u64,
    pub likes: u64,
}

/// A search hit joined with its statistics. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub views: u64,
    pub likes: u64,
}

impl VideoRecord {
    pub fn new(hit: SearchHit, stats: VideoStatistics) -> Self {
        Self {
            video_id: hit.video_id,
            title: hit.title,
            description: hit.description,
            channel_title: hit.channel_title,
            views: stats.views,
            likes: stats.likes,
        }
    }
}

/// The three upstream calls the analysis needs. The real implementation talks to
/// the YouTube Data API; tests plug in canned data.
#[async_trait::async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Video-type search, `part=snippet`, at most `max_results` hits in rank order.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, UpstreamError>;

    /// Statistics for one video. Missing counters come back as 0.
    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics, UpstreamError>;

    /// First page of top-level comment threads as plain text.
    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, UpstreamError>;

    fn name(&self) -> &'static str;
}

/// Search, then look up statistics one video at a time.
/// Any failing call aborts the whole fetch.
pub async fn fetch_videos(
    platform: &dyn VideoPlatform,
    query: &str,
    max_results: u32,
) -> Result<Vec<VideoRecord>, UpstreamError> {
    if max_results == 0 {
        return Ok(Vec::new());
    }
    let page = max_results.min(MAX_PAGE_SIZE);

    let hits = platform.search(query, page).await?;
    tracing::debug!(provider = platform.name(), query, hits = hits.len(), "search done");

    let mut out = Vec::with_capacity(hits.len());
    for hit in hits.into_iter().take(page as usize) {
        let stats = platform.statistics(&hit.video_id).await?;
        out.push(VideoRecord::new(hit, stats));
    }
    Ok(out)
}

/// First page of comments for one video, at most `max_comments` (capped at the page size).
/// A video with comments turned off yields an empty list instead of an error.
pub async fn fetch_comments(
    platform: &dyn VideoPlatform,
    video_id: &str,
    max_comments: u32,
) -> Result<Vec<String>, UpstreamError> {
    let page = max_comments.min(MAX_PAGE_SIZE);
    if page == 0 {
        return Ok(Vec::new());
    }

    match platform.comment_threads(video_id, page).await {
        Ok(mut comments) => {
            comments.truncate(page as usize);
            Ok(comments)
        }
        Err(UpstreamError::CommentsDisabled(msg)) => {
            tracing::warn!(video_id, reason = %msg, "comments disabled; scoring as neutral");
            counter!("sov_comments_absorbed_total").increment(1);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

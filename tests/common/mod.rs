// tests/common/mod.rs
//
// Canned video platform so the router can be exercised without the network.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sov_analyzer::youtube::{SearchHit, UpstreamError, VideoPlatform, VideoStatistics};
use sov_analyzer::AppConfig;

#[derive(Clone)]
pub enum Comments {
    Text(Vec<String>),
    Disabled,
    Quota,
}

#[derive(Clone)]
pub struct StubVideo {
    pub hit: SearchHit,
    pub stats: VideoStatistics,
    pub comments: Comments,
    /// Artificial latency of the comment call, to shuffle completion order.
    pub comment_delay_ms: u64,
}

pub fn video(id: &str, title: &str, channel: &str, comments: &[&str]) -> StubVideo {
    StubVideo {
        hit: SearchHit {
            video_id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            channel_title: channel.to_string(),
        },
        stats: VideoStatistics {
            views: 1000,
            likes: 50,
        },
        comments: Comments::Text(comments.iter().map(|c| c.to_string()).collect()),
        comment_delay_ms: 0,
    }
}

#[derive(Default)]
pub struct StubPlatform {
    pub videos: Vec<StubVideo>,
    pub search_error: Option<fn() -> UpstreamError>,
    pub search_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub comment_calls: AtomicUsize,
}

impl StubPlatform {
    pub fn with_videos(videos: Vec<StubVideo>) -> Self {
        Self {
            videos,
            ..Self::default()
        }
    }

    fn find(&self, id: &str) -> Option<&StubVideo> {
        self.videos.iter().find(|v| v.hit.video_id == id)
    }
}

#[async_trait::async_trait]
impl VideoPlatform for StubPlatform {
    async fn search(&self, _query: &str, max_results: u32) -> Result<Vec<SearchHit>, UpstreamError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make) = self.search_error {
            return Err(make());
        }
        Ok(self
            .videos
            .iter()
            .take(max_results as usize)
            .map(|v| v.hit.clone())
            .collect())
    }

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics, UpstreamError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(video_id).map(|v| v.stats).unwrap_or_default())
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, UpstreamError> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        let Some(v) = self.find(video_id) else {
            return Err(UpstreamError::NotFound(video_id.to_string()));
        };
        if v.comment_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(v.comment_delay_ms)).await;
        }
        match &v.comments {
            Comments::Text(c) => Ok(c.iter().take(max_results as usize).cloned().collect()),
            Comments::Disabled => Err(UpstreamError::CommentsDisabled(format!(
                "video {video_id} has disabled comments"
            ))),
            Comments::Quota => Err(UpstreamError::QuotaExceeded("daily quota".into())),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn test_config(export_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        youtube_api_key: "test-key".into(),
        export_dir: export_dir.to_path_buf(),
        ..AppConfig::default()
    }
}

/// Build the same Router the binary uses, backed by `platform`.
pub fn test_router(platform: Arc<StubPlatform>, export_dir: &std::path::Path) -> Router {
    sov_analyzer::app_with_platform(&test_config(export_dir), platform)
        .expect("app should build in tests")
}

/// The two-video scenario: one title mentions the brand, one does not.
pub fn atomberg_fan_videos() -> Vec<StubVideo> {
    vec![
        video(
            "vidA",
            "Atomberg Smart Fan unboxing",
            "Tech Guru",
            &["Love this fan, very quiet", "Great value"],
        ),
        video(
            "vidB",
            "Generic Fan Review",
            "Home Reviews",
            &["Terrible noise", "Not good"],
        ),
    ]
}

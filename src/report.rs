// src/report.rs
//! End-to-end analysis: fetch → comments + sentiment per video → aggregate → charts → CSV.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregate::{aggregate, round2, AggregateError, AnalyzedVideo};
use crate::charts::{self, BarDatum, ChartError};
use crate::export::{ExportError, ExportStore};
use crate::sentiment::PolarityScorer;
use crate::youtube::{fetch_comments, fetch_videos, UpstreamError, VideoPlatform, VideoRecord};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("per-video worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Charts {
    /// base64-encoded PNG
    pub pie_chart: String,
    /// base64-encoded PNG
    pub bar_chart: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: String,
    pub brand: String,
    pub total_results: usize,
    pub share_of_voice: f64,
    /// True when the search came back empty and share of voice is reported as 0.
    pub no_data: bool,
    pub videos: Vec<AnalyzedVideo>,
    pub charts: Charts,
    pub csv_download_url: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub brand: String,
    pub fetch_concurrency: usize,
    pub max_comments: u32,
}

pub struct Analyzer {
    platform: Arc<dyn VideoPlatform>,
    scorer: Arc<dyn PolarityScorer>,
    exports: Arc<ExportStore>,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(
        platform: Arc<dyn VideoPlatform>,
        scorer: Arc<dyn PolarityScorer>,
        exports: Arc<ExportStore>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            platform,
            scorer,
            exports,
            settings,
        }
    }

    pub fn exports(&self) -> &Arc<ExportStore> {
        &self.exports
    }

    pub async fn run(&self, query: &str, max_results: u32) -> Result<Report, ReportError> {
        let t0 = Instant::now();
        let brand = self.settings.brand.as_str();

        let videos = fetch_videos(self.platform.as_ref(), query, max_results).await?;
        let scores = self.score_videos(&videos).await?;
        let agg = aggregate(videos, &scores, brand)?;

        let (share_of_voice, no_data) = match agg.share_of_voice() {
            Ok(s) => (round2(s), false),
            Err(AggregateError::NoVideos) => (0.0, true),
            Err(e) => return Err(e.into()),
        };

        let pie = charts::render_pie(&brand_label(brand), agg.mention_count, agg.total())?;
        let bars: Vec<BarDatum> = agg
            .videos
            .iter()
            .map(|v| BarDatum {
                label: v.channel.clone(),
                value: v.sentiment,
            })
            .collect();
        let bar = charts::render_bar(&bars)?;

        let export = self.exports.write(&agg.videos).await?;

        let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
        counter!("sov_analyses_total").increment(1);
        histogram!("sov_analysis_ms").record(elapsed_ms);
        tracing::info!(
            query,
            total = agg.total(),
            mentions = agg.mention_count,
            share_of_voice,
            elapsed_ms = elapsed_ms as u64,
            "analysis finished"
        );

        Ok(Report {
            query: query.to_string(),
            brand: brand.to_string(),
            total_results: agg.total(),
            share_of_voice,
            no_data,
            videos: agg.videos,
            charts: Charts {
                pie_chart: pie.to_base64(),
                bar_chart: bar.to_base64(),
            },
            csv_download_url: export.download_url(),
            generated_at: chrono::Utc::now(),
        })
    }

    /// Comment fetch + scoring for every video, at most `fetch_concurrency` at a time.
    /// `scores[i]` always belongs to `videos[i]`. The first failure aborts the rest.
    async fn score_videos(&self, videos: &[VideoRecord]) -> Result<Vec<f64>, ReportError> {
        let permits = Arc::new(Semaphore::new(self.settings.fetch_concurrency.max(1)));
        let mut set = JoinSet::new();

        for (idx, v) in videos.iter().enumerate() {
            let platform = Arc::clone(&self.platform);
            let scorer = Arc::clone(&self.scorer);
            let permits = Arc::clone(&permits);
            let video_id = v.video_id.clone();
            let max_comments = self.settings.max_comments;

            set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| UpstreamError::Transient(e.to_string()))?;
                let comments = fetch_comments(platform.as_ref(), &video_id, max_comments).await?;
                let score = scorer.score_comments(&comments);
                tracing::debug!(%video_id, comments = comments.len(), score, "video scored");
                Ok::<_, UpstreamError>((idx, score))
            });
        }

        let mut scores = vec![0.0; videos.len()];
        while let Some(joined) = set.join_next().await {
            let (idx, score) = joined.map_err(|e| ReportError::Worker(e.to_string()))??;
            scores[idx] = score;
        }
        Ok(scores)
    }
}

/// "atomberg" → "Atomberg", used as the pie slice label.
pub fn brand_label(brand: &str) -> String {
    let mut chars = brand.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_label_capitalises_first_letter() {
        assert_eq!(brand_label("atomberg"), "Atomberg");
        assert_eq!(brand_label(""), "");
    }
}

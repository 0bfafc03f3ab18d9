//! Joins fetched videos with their sentiment and brand-mention flag,
//! and computes share of voice over the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::youtube::VideoRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("share of voice is undefined for an empty result set")]
    NoVideos,
    #[error("got {scores} sentiment scores for {videos} videos")]
    Misaligned { videos: usize, scores: usize },
}

/// One row of the report and of the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedVideo {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    pub views: u64,
    pub likes: u64,
    /// Wire name is fixed; it carries the configured brand's flag.
    pub mentions_atomberg: bool,
    pub sentiment: f64,
}

impl AnalyzedVideo {
    pub fn new(v: VideoRecord, brand: &str, sentiment: f64) -> Self {
        let mentions = mentions_brand(&v, brand);
        Self {
            video_id: v.video_id,
            title: v.title,
            description: v.description,
            channel: v.channel_title,
            views: v.views,
            likes: v.likes,
            mentions_atomberg: mentions,
            sentiment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub videos: Vec<AnalyzedVideo>,
    pub mention_count: usize,
}

impl Aggregate {
    pub fn total(&self) -> usize {
        self.videos.len()
    }

    /// Unrounded percentage in [0, 100].
    pub fn share_of_voice(&self) -> Result<f64, AggregateError> {
        share_of_voice(self.mention_count, self.total())
    }
}

/// Case-insensitive substring match of `brand` in the title or the description.
pub fn mentions_brand(v: &VideoRecord, brand: &str) -> bool {
    let needle = brand.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    v.title.to_lowercase().contains(&needle) || v.description.to_lowercase().contains(&needle)
}

pub fn share_of_voice(mentions: usize, total: usize) -> Result<f64, AggregateError> {
    if total == 0 {
        return Err(AggregateError::NoVideos);
    }
    Ok(100.0 * mentions.min(total) as f64 / total as f64)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `scores[i]` belongs to `videos[i]`; output keeps fetch order.
pub fn aggregate(
    videos: Vec<VideoRecord>,
    scores: &[f64],
    brand: &str,
) -> Result<Aggregate, AggregateError> {
    if videos.len() != scores.len() {
        return Err(AggregateError::Misaligned {
            videos: videos.len(),
            scores: scores.len(),
        });
    }

    let analyzed: Vec<AnalyzedVideo> = videos
        .into_iter()
        .zip(scores.iter().copied())
        .map(|(v, s)| AnalyzedVideo::new(v, brand, s))
        .collect();
    let mention_count = analyzed.iter().filter(|v| v.mentions_atomberg).count();

    Ok(Aggregate {
        videos: analyzed,
        mention_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, title: &str, description: &str) -> VideoRecord {
        VideoRecord {
            video_id: id.into(),
            title: title.into(),
            description: description.into(),
            channel_title: format!("{id}-channel"),
            views: 10,
            likes: 1,
        }
    }

    #[test]
    fn mention_is_case_insensitive_in_either_field() {
        assert!(mentions_brand(&video("a", "ATOMBERG Renesa", ""), "atomberg"));
        assert!(mentions_brand(&video("b", "Best fans", "by AtomBerg"), "atomberg"));
        assert!(!mentions_brand(&video("c", "Generic Fan Review", "Havells"), "atomberg"));
        assert!(!mentions_brand(&video("d", "anything", ""), "  "));
    }

    #[test]
    fn half_of_two_videos_is_fifty_percent() {
        let vids = vec![
            video("a", "Atomberg Smart Fan", ""),
            video("b", "Generic Fan Review", ""),
        ];
        let agg = aggregate(vids, &[0.4, -0.1], "atomberg").unwrap();
        assert_eq!(agg.total(), 2);
        assert_eq!(agg.mention_count, 1);
        assert_eq!(agg.share_of_voice().unwrap(), 50.0);
        assert!(agg.videos[0].mentions_atomberg);
        assert_eq!(agg.videos[1].sentiment, -0.1);
        assert_eq!(agg.videos[1].channel, "b-channel");
    }

    #[test]
    fn extremes_are_zero_and_hundred() {
        let none = aggregate(vec![video("a", "x", "y"), video("b", "z", "")], &[0.0, 0.0], "atomberg")
            .unwrap();
        assert_eq!(none.share_of_voice().unwrap(), 0.0);

        let all = aggregate(
            vec![video("a", "atomberg", ""), video("b", "", "ATOMBERG")],
            &[0.0, 0.0],
            "atomberg",
        )
        .unwrap();
        assert_eq!(all.share_of_voice().unwrap(), 100.0);
    }

    #[test]
    fn empty_result_set_is_a_defined_error() {
        let agg = aggregate(Vec::new(), &[], "atomberg").unwrap();
        assert_eq!(agg.share_of_voice(), Err(AggregateError::NoVideos));
        assert_eq!(share_of_voice(0, 0), Err(AggregateError::NoVideos));
    }

    #[test]
    fn misaligned_scores_are_rejected() {
        let err = aggregate(vec![video("a", "", "")], &[], "atomberg").unwrap_err();
        assert_eq!(err, AggregateError::Misaligned { videos: 1, scores: 0 });
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        let third = share_of_voice(1, 3).unwrap();
        assert_eq!(round2(third), 33.33);
        assert_eq!(round2(share_of_voice(2, 3).unwrap()), 66.67);
    }
}

// tests/report_pipeline.rs
//
// Analyzer-level tests (no HTTP): ordering under concurrent fan-out,
// share-of-voice properties and determinism.

mod common;

use std::sync::Arc;

use sov_analyzer::export::ExportStore;
use sov_analyzer::report::{Analyzer, AnalyzerSettings, ReportError};
use sov_analyzer::sentiment::{LexiconScorer, PolarityScorer};
use sov_analyzer::youtube::UpstreamError;

use common::{atomberg_fan_videos, video, Comments, StubPlatform, StubVideo};

fn analyzer(platform: StubPlatform, dir: &std::path::Path, concurrency: usize) -> Analyzer {
    Analyzer::new(
        Arc::new(platform),
        Arc::new(LexiconScorer::new()),
        Arc::new(ExportStore::new(dir)),
        AnalyzerSettings {
            brand: "atomberg".into(),
            fetch_concurrency: concurrency,
            max_comments: 50,
        },
    )
}

fn titled(titles: &[&str]) -> Vec<StubVideo> {
    titles
        .iter()
        .enumerate()
        .map(|(i, t)| video(&format!("v{i}"), t, &format!("chan{i}"), &["good"]))
        .collect()
}

#[tokio::test]
async fn output_order_follows_search_rank_not_completion() {
    let tmp = tempfile::tempdir().unwrap();
    // earlier videos answer slower, so completion order is reversed
    let videos: Vec<StubVideo> = (0..6)
        .map(|i| {
            let comment = if i % 2 == 0 { "great" } else { "awful" };
            let mut v = video(&format!("v{i}"), "fan", &format!("chan{i}"), &[comment]);
            v.comment_delay_ms = (6 - i) * 15;
            v
        })
        .collect();
    let a = analyzer(StubPlatform::with_videos(videos), tmp.path(), 4);

    let report = a.run("fan", 6).await.unwrap();
    let ids: Vec<&str> = report.videos.iter().map(|v| v.video_id.as_str()).collect();
    assert_eq!(ids, ["v0", "v1", "v2", "v3", "v4", "v5"]);
    for (i, v) in report.videos.iter().enumerate() {
        if i % 2 == 0 {
            assert!(v.sentiment > 0.0, "v{i} should be positive");
        } else {
            assert!(v.sentiment < 0.0, "v{i} should be negative");
        }
    }
}

#[tokio::test]
async fn sequential_and_concurrent_runs_agree() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = analyzer(StubPlatform::with_videos(atomberg_fan_videos()), tmp.path(), 1)
        .run("atomberg fan", 2)
        .await
        .unwrap();
    let par = analyzer(StubPlatform::with_videos(atomberg_fan_videos()), tmp.path(), 8)
        .run("atomberg fan", 2)
        .await
        .unwrap();
    assert_eq!(seq.videos, par.videos);
    assert_eq!(seq.share_of_voice, par.share_of_voice);
    assert_eq!(seq.csv_download_url, par.csv_download_url);
}

#[tokio::test]
async fn share_of_voice_bounds_and_extremes() {
    let tmp = tempfile::tempdir().unwrap();

    let none = analyzer(
        StubPlatform::with_videos(titled(&["Havells fan", "Crompton review", "Orient"])),
        tmp.path(),
        2,
    )
    .run("ceiling fan", 3)
    .await
    .unwrap();
    assert_eq!(none.share_of_voice, 0.0);

    let all = analyzer(
        StubPlatform::with_videos(titled(&["ATOMBERG Renesa", "atomberg efficio", "AtomBerg"])),
        tmp.path(),
        2,
    )
    .run("atomberg", 3)
    .await
    .unwrap();
    assert_eq!(all.share_of_voice, 100.0);

    let third = analyzer(
        StubPlatform::with_videos(titled(&["Atomberg", "b", "c"])),
        tmp.path(),
        2,
    )
    .run("fan", 3)
    .await
    .unwrap();
    assert_eq!(third.share_of_voice, 33.33);

    for r in [&none, &all, &third] {
        assert_eq!(r.total_results, r.videos.len());
        assert!((0.0..=100.0).contains(&r.share_of_voice));
        for v in &r.videos {
            assert!((-1.0..=1.0).contains(&v.sentiment));
        }
    }
}

#[tokio::test]
async fn description_mention_counts() {
    let tmp = tempfile::tempdir().unwrap();
    let mut vids = titled(&["Best BLDC fans 2024", "Fan noise test"]);
    vids[0].hit.description = "Featuring the Atomberg Renesa+".into();
    let r = analyzer(StubPlatform::with_videos(vids), tmp.path(), 2)
        .run("bldc fan", 2)
        .await
        .unwrap();
    assert!(r.videos[0].mentions_atomberg);
    assert!(!r.videos[1].mentions_atomberg);
    assert_eq!(r.share_of_voice, 50.0);
}

#[tokio::test]
async fn repeated_runs_are_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let a = analyzer(StubPlatform::with_videos(atomberg_fan_videos()), tmp.path(), 3);
    let r1 = a.run("atomberg fan", 2).await.unwrap();
    let r2 = a.run("atomberg fan", 2).await.unwrap();
    let flags = |r: &sov_analyzer::report::Report| -> Vec<bool> {
        r.videos.iter().map(|v| v.mentions_atomberg).collect()
    };
    assert_eq!(flags(&r1), flags(&r2));
    assert_eq!(r1.share_of_voice, r2.share_of_voice);
    assert_eq!(r1.charts.pie_chart, r2.charts.pie_chart);
}

#[tokio::test]
async fn disabled_comments_score_neutral() {
    let tmp = tempfile::tempdir().unwrap();
    let mut vids = atomberg_fan_videos();
    vids[0].comments = Comments::Disabled;
    let r = analyzer(StubPlatform::with_videos(vids), tmp.path(), 2)
        .run("atomberg fan", 2)
        .await
        .unwrap();
    assert_eq!(r.total_results, 2);
    assert_eq!(r.videos[0].sentiment, 0.0);
    assert!(r.videos[0].mentions_atomberg);
}

#[tokio::test]
async fn upstream_error_aborts_without_partial_report() {
    let tmp = tempfile::tempdir().unwrap();
    let mut vids = atomberg_fan_videos();
    vids[1].comments = Comments::Quota;
    let a = analyzer(StubPlatform::with_videos(vids), tmp.path(), 2);

    let err = a.run("atomberg fan", 2).await.unwrap_err();
    assert!(matches!(
        err,
        ReportError::Upstream(UpstreamError::QuotaExceeded(_))
    ));
    assert!(a.exports().latest().is_none());
}

#[test]
fn scorer_contract_holds_for_comment_blocks() {
    let s = LexiconScorer::new();
    assert_eq!(s.score_comments(&[]), 0.0);
    let blocks = [
        vec!["Love it".to_string(), "works great".to_string()],
        vec!["worst purchase ever".to_string()],
        vec!["meh".to_string(), String::new()],
    ];
    for b in &blocks {
        let v = s.score_comments(b);
        assert!((-1.0..=1.0).contains(&v), "{v} out of range");
    }
}

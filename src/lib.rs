// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod charts;
pub mod config;
pub mod export;
pub mod metrics;
pub mod report;
pub mod sentiment;
pub mod youtube;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

pub use crate::api::router;
pub use crate::config::AppConfig;

use crate::api::AppState;
use crate::export::ExportStore;
use crate::report::{Analyzer, AnalyzerSettings};
use crate::sentiment::{LexiconScorer, PolarityScorer};
use crate::youtube::{VideoPlatform, YouTubeClient};

/// Build the full in-process app against the real YouTube Data API.
pub fn app(config: &AppConfig) -> anyhow::Result<Router> {
    let client = YouTubeClient::new(config.youtube_api_key.clone(), config.api_base_url.clone())
        .context("building YouTube HTTP client")?;
    app_with_platform(config, Arc::new(client))
}

/// Same as [`app`] but with an injected platform (tests, alternative backends).
pub fn app_with_platform(
    config: &AppConfig,
    platform: Arc<dyn VideoPlatform>,
) -> anyhow::Result<Router> {
    let cors_origin = config.cors_header().context("validating CORS origin")?;
    let exports = Arc::new(
        ExportStore::new(config.export_dir.clone()).with_retention(config.export_retention),
    );
    let scorer: Arc<dyn PolarityScorer> = Arc::new(LexiconScorer::new());

    let analyzer = Analyzer::new(
        platform,
        scorer,
        Arc::clone(&exports),
        AnalyzerSettings {
            brand: config.brand.clone(),
            fetch_concurrency: config.fetch_concurrency,
            max_comments: config.max_comments,
        },
    );

    let state = AppState {
        analyzer: Arc::new(analyzer),
        exports,
        default_results: config.default_results,
        cors_origin,
        metrics: metrics::Metrics::init(),
    };
    Ok(api::router(state))
}

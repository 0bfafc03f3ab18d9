//! Share-of-voice service binary entrypoint.
//! Loads config, installs tracing, and serves the Axum router.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sov_analyzer::AppConfig;

/// Compact logs by default; `SOV_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sov_analyzer=info,tower_http=warn"));

    let json = std::env::var("SOV_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env().context("loading configuration")?;
    tracing::info!(
        brand = %config.brand,
        cors_origin = %config.cors_origin,
        export_dir = %config.export_dir.display(),
        concurrency = config.fetch_concurrency,
        key_len = config.youtube_api_key.len(),
        "config loaded"
    );

    let router = sov_analyzer::app(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, router).await.context("serving http")?;
    Ok(())
}

// src/config/app.rs
use std::fmt;
use std::path::{Path, PathBuf};
use std::{env, fs};

use axum::http::HeaderValue;
use serde::Deserialize;
use thiserror::Error;

use crate::export::DEFAULT_RETENTION;
use crate::youtube::client::DEFAULT_API_BASE;

pub const ENV_CONFIG_PATH: &str = "SOV_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/sov.toml";
pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";

const DEFAULT_BRAND: &str = "atomberg";
const DEFAULT_CONCURRENCY: usize = 4;
const MAX_CONCURRENCY: usize = 16;
const DEFAULT_RESULTS: u32 = 20;
const MAX_COMMENTS: u32 = 50;
const MAX_EXPORT_RETENTION: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing YOUTUBE_API_KEY: the video platform API key must be configured")]
    MissingApiKey,
    #[error("reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid CORS origin {0:?}")]
    InvalidCorsOrigin(String),
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// "ENV" means: read from YOUTUBE_API_KEY
    pub youtube_api_key: String,
    pub api_base_url: String,
    /// Brand token matched case-insensitively in titles and descriptions.
    pub brand: String,
    pub cors_origin: String,
    pub export_dir: PathBuf,
    /// How many CSV exports stay on disk.
    pub export_retention: usize,
    pub fetch_concurrency: usize,
    pub bind_addr: String,
    pub default_results: u32,
    pub max_comments: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: String::new(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            brand: DEFAULT_BRAND.to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            export_dir: PathBuf::from("exports"),
            export_retention: DEFAULT_RETENTION,
            fetch_concurrency: DEFAULT_CONCURRENCY,
            bind_addr: "0.0.0.0:8000".to_string(),
            default_results: DEFAULT_RESULTS,
            max_comments: MAX_COMMENTS,
        }
    }
}

// The key never shows up in logs, only its length.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("key_len", &self.youtube_api_key.len())
            .field("api_base_url", &self.api_base_url)
            .field("brand", &self.brand)
            .field("cors_origin", &self.cors_origin)
            .field("export_dir", &self.export_dir)
            .field("export_retention", &self.export_retention)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("bind_addr", &self.bind_addr)
            .field("default_results", &self.default_results)
            .field("max_comments", &self.max_comments)
            .finish()
    }
}

impl AppConfig {
    /// Load config using env var + fallbacks:
    /// 1) $SOV_CONFIG_PATH (must exist)
    /// 2) config/sov.toml if present
    /// 3) built-in defaults
    ///
    /// Environment variables override file values; the API key is mandatory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(p)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        cfg.apply_env_overrides();
        cfg.finish()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var(ENV_API_KEY) {
            self.youtube_api_key = v;
        }
        if let Ok(v) = env::var("YOUTUBE_API_BASE") {
            self.api_base_url = v;
        }
        if let Ok(v) = env::var("SOV_BRAND") {
            self.brand = v;
        }
        if let Ok(v) = env::var("SOV_CORS_ORIGIN") {
            self.cors_origin = v;
        }
        if let Ok(v) = env::var("SOV_EXPORT_DIR") {
            self.export_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("SOV_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(n) = env::var("SOV_EXPORT_RETENTION")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.export_retention = n;
        }
        if let Some(n) = env::var("SOV_FETCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.fetch_concurrency = n;
        }
    }

    /// Resolve the key, sanitize ranges and validate what the server cannot run without.
    pub fn finish(mut self) -> Result<Self, ConfigError> {
        let key = self.youtube_api_key.trim();
        if key.eq_ignore_ascii_case("env") {
            self.youtube_api_key = env::var(ENV_API_KEY).map_err(|_| ConfigError::MissingApiKey)?;
        }
        self.youtube_api_key = self.youtube_api_key.trim().to_string();
        if self.youtube_api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        self.sanitize();
        self.cors_header()?;
        Ok(self)
    }

    fn sanitize(&mut self) {
        self.brand = self.brand.trim().to_lowercase();
        if self.brand.is_empty() {
            self.brand = DEFAULT_BRAND.to_string();
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.fetch_concurrency) {
            self.fetch_concurrency = DEFAULT_CONCURRENCY;
        }
        if !(1..=MAX_EXPORT_RETENTION).contains(&self.export_retention) {
            self.export_retention = DEFAULT_RETENTION;
        }
        if !(1..=MAX_COMMENTS).contains(&self.max_comments) {
            self.max_comments = MAX_COMMENTS;
        }
        if !(1..=crate::youtube::MAX_PAGE_SIZE).contains(&self.default_results) {
            self.default_results = DEFAULT_RESULTS;
        }
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = DEFAULT_API_BASE.to_string();
        }
    }

    /// The single origin allowed to make credentialed requests.
    pub fn cors_header(&self) -> Result<HeaderValue, ConfigError> {
        let origin = self.cors_origin.trim();
        if origin.is_empty() || origin == "*" {
            return Err(ConfigError::InvalidCorsOrigin(self.cors_origin.clone()));
        }
        HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidCorsOrigin(self.cors_origin.clone()))
    }
}

// src/export.rs
//! CSV export of analyzed videos.
//!
//! Each export is content-addressed (`<sha256>.csv`) and written through a
//! temp file + rename, so concurrent analyses never clobber each other's file.
//! Only the newest `retention` exports are kept on disk. The id of the most
//! recent one is also written to `LATEST` so `/download_csv` survives a restart.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::aggregate::AnalyzedVideo;

pub const DEFAULT_RETENTION: usize = 5;
const LATEST_FILE: &str = "LATEST";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no export has been written yet")]
    NotFound,
    #[error("malformed export id")]
    InvalidId,
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("export io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHandle {
    pub id: String,
    pub path: PathBuf,
}

impl ExportHandle {
    pub fn download_url(&self) -> String {
        format!("/download_csv/{}", self.id)
    }
}

#[derive(Debug)]
pub struct ExportStore {
    dir: PathBuf,
    retention: usize,
    latest: RwLock<Option<ExportHandle>>,
    // ids written by this process, oldest first; also serializes rename + prune
    recent: Mutex<Vec<String>>,
    tmp_seq: AtomicU64,
}

impl ExportStore {
    /// Opens the store and picks up the latest pointer left by a previous run.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let latest = load_latest(&dir);
        if let Some(h) = &latest {
            tracing::debug!(id = %h.id, "resuming latest csv export");
        }
        Self {
            dir,
            retention: DEFAULT_RETENTION,
            latest: RwLock::new(latest),
            recent: Mutex::new(Vec::new()),
            tmp_seq: AtomicU64::new(0),
        }
    }

    /// Number of exports kept on disk; values below 1 are treated as 1.
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub async fn write(&self, videos: &[AnalyzedVideo]) -> Result<ExportHandle, ExportError> {
        let bytes = to_csv(videos)?;
        let id = content_id(&bytes);
        let path = self.dir.join(format!("{id}.csv"));

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.tmp_path(&id);
        tokio::fs::write(&tmp, &bytes).await?;

        let mut recent = self.recent.lock().await;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        self.persist_latest(&id).await?;

        let handle = ExportHandle { id, path };
        *self.latest.write().unwrap_or_else(|p| p.into_inner()) = Some(handle.clone());
        recent.retain(|r| *r != handle.id);
        recent.push(handle.id.clone());
        let excess = recent.len().saturating_sub(self.retention);
        recent.drain(..excess);
        self.prune(&recent).await;
        tracing::debug!(id = %handle.id, rows = videos.len(), "csv export written");
        Ok(handle)
    }

    pub fn latest(&self) -> Option<ExportHandle> {
        self.latest
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Looks up an export by id; the id must be a sha256 hex digest.
    pub async fn resolve(&self, id: &str) -> Result<ExportHandle, ExportError> {
        if !is_content_id(id) {
            return Err(ExportError::InvalidId);
        }
        let path = self.dir.join(format!("{id}.csv"));
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => Ok(ExportHandle {
                id: id.to_string(),
                path,
            }),
            Ok(_) => Err(ExportError::NotFound),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExportError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, handle: &ExportHandle) -> Result<Vec<u8>, ExportError> {
        match tokio::fs::read(&handle.path).await {
            Ok(b) => Ok(b),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExportError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self, id: &str) -> PathBuf {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{id}.{}.{seq}.tmp", std::process::id()))
    }

    async fn persist_latest(&self, id: &str) -> Result<(), ExportError> {
        let tmp = self.tmp_path(LATEST_FILE);
        tokio::fs::write(&tmp, id.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.dir.join(LATEST_FILE)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Drops exports beyond the retention bound, oldest first. Files from earlier
    /// runs rank below anything in `recent`. Failures are only logged.
    async fn prune(&self, recent: &[String]) {
        let mut exports = match self.list_exports().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "listing csv exports failed");
                return;
            }
        };
        if exports.len() <= self.retention {
            return;
        }

        let rank = |id: &str| recent.iter().position(|r| r == id);
        // newest first
        exports.sort_by(|a, b| rank(&b.0).cmp(&rank(&a.0)).then(b.1.cmp(&a.1)));
        for (id, _) in exports.into_iter().skip(self.retention) {
            let path = self.dir.join(format!("{id}.csv"));
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(%id, "csv export pruned"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(%id, error = %e, "pruning csv export failed"),
            }
        }
    }

    async fn list_exports(&self) -> std::io::Result<Vec<(String, SystemTime)>> {
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.strip_suffix(".csv")) else {
                continue;
            };
            if !is_content_id(id) {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((id.to_string(), modified));
        }
        Ok(out)
    }
}

// Startup-only, before the server accepts requests.
fn load_latest(dir: &Path) -> Option<ExportHandle> {
    let raw = std::fs::read_to_string(dir.join(LATEST_FILE)).ok()?;
    let id = raw.trim();
    if !is_content_id(id) {
        return None;
    }
    let path = dir.join(format!("{id}.csv"));
    path.is_file().then(|| ExportHandle {
        id: id.to_string(),
        path,
    })
}

/// Header row comes from the `AnalyzedVideo` field names; an empty set still gets one.
pub fn to_csv(videos: &[AnalyzedVideo]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if videos.is_empty() {
        wtr.write_record([
            "videoId",
            "title",
            "description",
            "channel",
            "views",
            "likes",
            "mentions_atomberg",
            "sentiment",
        ])?;
    }
    for v in videos {
        wtr.serialize(v)?;
    }
    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

fn content_id(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn is_content_id(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

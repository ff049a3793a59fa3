//! Channel loader
//!
//! Resolves the channel list through a fallback chain, stopping at the
//! first source that yields channels:
//!
//! 1. the cache, when allowed and non-empty
//! 2. the external playlist file, cached as `EXTERNAL` on success
//! 3. the built-in definitions, cached as `BUILTIN` on success
//!
//! Loading never fails outward. When every source is unavailable the result
//! is an empty list.
//!
//! Run loads off any latency-sensitive path, one at a time per cache
//! directory: the loader writes the cache and does no locking of its own.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::builtin::BuiltinSource;
use crate::cache::CacheStore;
use crate::models::{Channel, ExternalSourceInfo, SourceKind};
use crate::playlist;

/// Where the side-loaded playlist is expected by default
pub const DEFAULT_EXTERNAL_PATH: &str = "/data/local/tmp/locust-tv/channels.m3u";

/// Files this size or smaller are treated as absent
pub const MIN_EXTERNAL_BYTES: u64 = 10;

/// Which step of the chain produced the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOutcome {
    Cache,
    External,
    Builtin,
    /// Nothing worked; the list is empty
    Exhausted,
}

/// Fallback-chain channel loader
#[derive(Debug, Clone)]
pub struct ChannelLoader {
    cache: CacheStore,
    external_path: PathBuf,
    min_external_bytes: u64,
    builtin: BuiltinSource,
}

impl ChannelLoader {
    /// Create a loader with the default external path and bundled channels
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache,
            external_path: PathBuf::from(DEFAULT_EXTERNAL_PATH),
            min_external_bytes: MIN_EXTERNAL_BYTES,
            builtin: BuiltinSource::Bundled,
        }
    }

    pub fn with_external_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.external_path = path.into();
        self
    }

    pub fn with_min_external_bytes(mut self, bytes: u64) -> Self {
        self.min_external_bytes = bytes;
        self
    }

    pub fn with_builtin(mut self, builtin: BuiltinSource) -> Self {
        self.builtin = builtin;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn external_path(&self) -> &Path {
        &self.external_path
    }

    /// Run the chain and return the channel list
    pub async fn load(&self, allow_cache: bool) -> Vec<Channel> {
        self.load_with_outcome(allow_cache).await.0
    }

    /// Run the chain and report which source answered
    pub async fn load_with_outcome(&self, allow_cache: bool) -> (Vec<Channel>, LoadOutcome) {
        if allow_cache {
            match self.cache.load().await {
                Ok(channels) if !channels.is_empty() => {
                    info!("Using cached channels: {}", channels.len());
                    return (channels, LoadOutcome::Cache);
                }
                Ok(_) => debug!("Cached channel list is empty"),
                Err(e) => debug!("Cache miss: {}", e),
            }
        }

        match self.read_external().await {
            Ok(Some(channels)) if !channels.is_empty() => {
                info!(
                    "Loaded external playlist {}: {} channels",
                    self.external_path.display(),
                    channels.len()
                );
                let origin = self.external_path.display().to_string();
                self.persist(&channels, SourceKind::External, &origin).await;
                return (channels, LoadOutcome::External);
            }
            Ok(_) => warn!("External playlist unavailable, falling back to built-in channels"),
            Err(e) => warn!("Failed to load external playlist: {:#}", e),
        }

        match self.builtin.read().await {
            Ok(channels) => {
                info!(
                    "Loaded built-in channels ({}): {}",
                    self.builtin.describe(),
                    channels.len()
                );
                self.persist(&channels, SourceKind::Builtin, "").await;
                (channels, LoadOutcome::Builtin)
            }
            Err(e) => {
                error!("Failed to load built-in channels: {}", e);
                (Vec::new(), LoadOutcome::Exhausted)
            }
        }
    }

    /// Cache a freshly loaded list; failures only get logged
    async fn persist(&self, channels: &[Channel], kind: SourceKind, origin: &str) {
        if let Err(e) = self.cache.save(channels, kind, origin).await {
            warn!("Failed to save channel cache: {}", e);
        }
    }

    /// Parse the external playlist, or `None` if it is absent or undersized
    async fn read_external(&self) -> Result<Option<Vec<Channel>>> {
        let path = &self.external_path;

        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("External playlist not found: {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", path.display()))
            }
        };

        if !meta.is_file() {
            warn!("External playlist is not a file: {}", path.display());
            return Ok(None);
        }
        if meta.len() <= self.min_external_bytes {
            warn!(
                "External playlist too small, possibly corrupt: {} bytes",
                meta.len()
            );
            return Ok(None);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!("External playlist not readable: {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        Ok(Some(playlist::parse(&content)))
    }

    /// Whether the external playlist exists, is readable and big enough
    pub async fn has_external_source(&self) -> bool {
        let info = self.external_source_info().await;
        info.exists
            && info.readable == Some(true)
            && info.size.is_some_and(|size| size > self.min_external_bytes)
    }

    /// Current filesystem state of the external playlist
    pub async fn external_source_info(&self) -> ExternalSourceInfo {
        let path = &self.external_path;
        let display = path.display().to_string();

        let Ok(meta) = tokio::fs::metadata(path).await else {
            return ExternalSourceInfo::missing(display);
        };

        let last_modified = meta
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis());
        let readable = meta.is_file() && tokio::fs::File::open(path).await.is_ok();

        ExternalSourceInfo {
            path: display,
            exists: true,
            size: Some(meta.len()),
            last_modified,
            readable: Some(readable),
        }
    }
}

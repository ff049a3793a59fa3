//! Configuration management for chanlist
//!
//! Config is read from ~/.config/chanlist/config.toml (or `--config`).
//! Every field is optional; a missing or unreadable file means defaults.
//! `CHANLIST_CACHE_DIR` and `CHANLIST_EXTERNAL_PATH` override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::builtin::BuiltinSource;
use crate::cache::CacheStore;
use crate::loader::{ChannelLoader, DEFAULT_EXTERNAL_PATH, MIN_EXTERNAL_BYTES};

/// Keywords that float channels to the top on import
const DEFAULT_PRIORITY_KEYWORDS: &[&str] = &[
    "CCTV",
    "卫视",
    "凤凰",
    "翡翠",
    "明珠",
    "本港",
    "HBO",
    "Discovery",
    "National Geographic",
    "BBC",
];

const DEFAULT_VALIDITY_HOURS: u64 = 24;
const DEFAULT_MAX_CHANNELS: usize = 500;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the two cache files
    pub cache_dir: Option<PathBuf>,
    /// Side-loaded playlist location
    pub external_path: Option<PathBuf>,
    /// JSON file replacing the bundled channel list
    pub builtin_path: Option<PathBuf>,
    /// Cache validity window in hours
    pub cache_validity_hours: Option<u64>,
    /// External playlists this size or smaller count as absent
    pub min_external_bytes: Option<u64>,
    /// Import keeps at most this many channels
    pub max_channels: Option<usize>,
    /// Import ordering keywords, highest priority first
    pub priority_keywords: Option<Vec<String>>,
}

impl Config {
    /// Get config file path (~/.config/chanlist/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chanlist").join("config.toml"))
    }

    /// Load config from the default path, then apply env overrides
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default().with_env_overrides(),
        }
    }

    /// Load config from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).unwrap_or_else(|e| {
                warn!("Ignoring invalid config {}: {:#}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Parse TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config TOML")
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("CHANLIST_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Ok(path) = std::env::var("CHANLIST_EXTERNAL_PATH") {
            self.external_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Cache directory, defaulting to ~/.cache/chanlist
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("chanlist")
        })
    }

    pub fn external_path(&self) -> PathBuf {
        self.external_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXTERNAL_PATH))
    }

    pub fn builtin_source(&self) -> BuiltinSource {
        match &self.builtin_path {
            Some(path) => BuiltinSource::File(path.clone()),
            None => BuiltinSource::Bundled,
        }
    }

    pub fn cache_validity(&self) -> Duration {
        let hours = self.cache_validity_hours.unwrap_or(DEFAULT_VALIDITY_HOURS);
        Duration::from_secs(hours * 60 * 60)
    }

    pub fn min_external_bytes(&self) -> u64 {
        self.min_external_bytes.unwrap_or(MIN_EXTERNAL_BYTES)
    }

    pub fn max_channels(&self) -> usize {
        self.max_channels.unwrap_or(DEFAULT_MAX_CHANNELS)
    }

    pub fn priority_keywords(&self) -> Vec<String> {
        self.priority_keywords.clone().unwrap_or_else(|| {
            DEFAULT_PRIORITY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect()
        })
    }

    /// Build the cache store this config describes
    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(self.cache_dir()).with_validity(self.cache_validity())
    }

    /// Build the loader this config describes
    pub fn loader(&self) -> ChannelLoader {
        ChannelLoader::new(self.cache_store())
            .with_external_path(self.external_path())
            .with_min_external_bytes(self.min_external_bytes())
            .with_builtin(self.builtin_source())
    }
}

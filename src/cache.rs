//! Channel cache store
//!
//! Persists a channel snapshot plus its metadata as two plain-text files in
//! a private cache directory:
//!
//! - `channels_cache.txt`: one `title|url|group` line per channel
//! - `channels_metadata.txt`: a single `kind|timestamp|count|origin` line
//!
//! The metadata timestamp governs validity for both files. Only the first
//! stream URL of each channel is kept, so multi-URL channels come back with
//! a single URL.
//!
//! Operations are single-flight: callers must not run two of them against
//! the same directory at once. Writes are two independent file writes, not an
//! atomic commit.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{normalize_key, AuthFields, CacheMetadata, Channel, SourceKind};

/// Snapshot file name
pub const CHANNELS_FILE: &str = "channels_cache.txt";

/// Metadata file name
pub const METADATA_FILE: &str = "channels_metadata.txt";

/// How long a snapshot stays valid unless configured otherwise
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Stats text when no metadata is present
pub const NO_CACHE: &str = "No cache";

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Why a cache operation produced nothing
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("malformed cache metadata: {0}")]
    Parse(String),

    #[error("cache expired ({age_ms} ms old)")]
    Expired { age_ms: i64 },

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Current wall-clock time in millis since epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// File-backed channel cache rooted at one directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    validity: Duration,
}

impl CacheStore {
    /// Create a store with the default 24h validity window
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            validity: DEFAULT_VALIDITY,
        }
    }

    /// Override the validity window
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn channels_path(&self) -> PathBuf {
        self.dir.join(CHANNELS_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Save a snapshot stamped with the current time
    pub async fn save(
        &self,
        channels: &[Channel],
        source_kind: SourceKind,
        origin_path: &str,
    ) -> Result<CacheMetadata, CacheError> {
        self.save_at(channels, source_kind, origin_path, now_millis())
            .await
    }

    /// Save a snapshot with an explicit timestamp
    pub async fn save_at(
        &self,
        channels: &[Channel],
        source_kind: SourceKind,
        origin_path: &str,
        timestamp: i64,
    ) -> Result<CacheMetadata, CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = channels
            .iter()
            .map(|ch| {
                format!(
                    "{}|{}|{}",
                    ch.title,
                    ch.primary_url().unwrap_or_default(),
                    ch.group
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        tokio::fs::write(self.channels_path(), body).await?;

        let metadata = CacheMetadata {
            source_kind,
            timestamp,
            channel_count: channels.len(),
            origin_path: origin_path.to_string(),
        };
        tokio::fs::write(self.metadata_path(), metadata.to_line()).await?;

        info!(
            "Channel cache saved: {} channels from {}",
            channels.len(),
            source_kind
        );
        Ok(metadata)
    }

    /// Load the snapshot if it is still valid now
    pub async fn load(&self) -> Result<Vec<Channel>, CacheError> {
        self.load_at(now_millis()).await
    }

    /// Load the snapshot if it is valid at `now_ms`
    pub async fn load_at(&self, now_ms: i64) -> Result<Vec<Channel>, CacheError> {
        let channels_path = self.channels_path();
        if !tokio::fs::try_exists(&channels_path).await? {
            return Err(CacheError::NotFound(channels_path));
        }

        let metadata = self.load_metadata().await?;
        if !self.is_valid_at(&metadata, now_ms) {
            return Err(CacheError::Expired {
                age_ms: now_ms.saturating_sub(metadata.timestamp),
            });
        }

        let content = read_text(&channels_path).await?;
        let channels = parse_snapshot(&content);
        info!("Loaded {} channels from cache", channels.len());
        Ok(channels)
    }

    /// Read the metadata file on its own
    ///
    /// The stored count is not compared with the snapshot.
    pub async fn load_metadata(&self) -> Result<CacheMetadata, CacheError> {
        let content = read_text(&self.metadata_path()).await?;
        CacheMetadata::parse_line(&content).map_err(CacheError::Parse)
    }

    /// Valid while strictly younger than the validity window
    ///
    /// An age that does not fit in an `i64` is treated as expired.
    pub fn is_valid_at(&self, metadata: &CacheMetadata, now_ms: i64) -> bool {
        let window = i64::try_from(self.validity.as_millis()).unwrap_or(i64::MAX);
        now_ms
            .checked_sub(metadata.timestamp)
            .is_some_and(|age| age < window)
    }

    /// Delete both cache files; missing files are fine
    ///
    /// Both deletes are attempted even if the first fails.
    pub async fn clear(&self) -> Result<(), CacheError> {
        let channels = remove_if_exists(&self.channels_path()).await;
        let metadata = remove_if_exists(&self.metadata_path()).await;
        channels?;
        metadata?;
        info!("Channel cache cleared");
        Ok(())
    }

    /// Human-readable summary of the cached snapshot
    pub async fn stats(&self) -> String {
        self.stats_at(now_millis()).await
    }

    pub async fn stats_at(&self, now_ms: i64) -> String {
        match self.load_metadata().await {
            Ok(metadata) => format_stats(&metadata, now_ms),
            Err(e) => {
                debug!("No cache stats: {}", e);
                NO_CACHE.to_string()
            }
        }
    }
}

/// Render the stats text for a metadata record
pub fn format_stats(metadata: &CacheMetadata, now_ms: i64) -> String {
    let hours = metadata.age_millis(now_ms) / MILLIS_PER_HOUR;
    format!(
        "Source: {}\nChannels: {}\nUpdated: {} hours ago",
        metadata.source_kind.label(),
        metadata.channel_count,
        hours
    )
}

/// Decode snapshot lines, skipping short or unusable ones
///
/// Fields are split from the right so a title may itself contain `|`.
fn parse_snapshot(content: &str) -> Vec<Channel> {
    let mut channels = Vec::new();

    for line in content.lines() {
        let mut parts = line.rsplitn(3, '|');
        let (Some(group), Some(url), Some(title)) = (parts.next(), parts.next(), parts.next())
        else {
            debug!("Skipping cache line: {:?}", line);
            continue;
        };
        if title.is_empty() || url.is_empty() {
            debug!("Skipping cache line: {:?}", line);
            continue;
        }

        channels.push(Channel {
            id: channels.len(),
            title: title.to_string(),
            key: normalize_key(title),
            stream_urls: vec![url.to_string()],
            group: group.to_string(),
            logo_url: String::new(),
            auth: AuthFields::default(),
        });
    }

    channels
}

async fn read_text(path: &Path) -> Result<String, CacheError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(path.to_path_buf())),
        Err(e) => Err(CacheError::Io(e)),
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::Io(e)),
    }
}

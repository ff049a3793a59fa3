//! Data structures shared across chanlist
//!
//! - **Channels**: the playable channel record and its auth flags
//! - **Cache**: source kind and snapshot metadata
//! - **External source**: filesystem facts about the side-loaded playlist

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Group label used when a channel carries none
pub const DEFAULT_GROUP: &str = "Other";

/// Title used when an info line has no display name
pub const DEFAULT_TITLE: &str = "Unknown";

// =============================================================================
// Channel Models
// =============================================================================

/// Token/auth identifiers, only populated for built-in channels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFields {
    pub pid: String,
    pub sid: String,
    pub program_id: String,
    pub needs_token: bool,
    pub must_have_token: bool,
}

/// A playable channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Position in the loaded list, not stable across reloads
    pub id: usize,
    pub title: String,
    /// Title with spaces removed; not unique
    pub key: String,
    pub stream_urls: Vec<String>,
    pub group: String,
    pub logo_url: String,
    #[serde(default)]
    pub auth: AuthFields,
}

impl Channel {
    /// Build a single-URL channel with no logo or auth data
    pub fn new(
        id: usize,
        title: impl Into<String>,
        url: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id,
            key: normalize_key(&title),
            title,
            stream_urls: vec![url.into()],
            group: group.into(),
            logo_url: String::new(),
            auth: AuthFields::default(),
        }
    }

    /// First stream URL, the one that survives caching
    pub fn primary_url(&self) -> Option<&str> {
        self.stream_urls.first().map(String::as_str)
    }

    /// Usable channels have a title and at least one URL
    pub fn is_playable(&self) -> bool {
        !self.title.is_empty() && self.stream_urls.iter().any(|u| !u.is_empty())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4}  {} [{}] {}",
            self.id,
            self.title,
            self.group,
            self.primary_url().unwrap_or("-")
        )
    }
}

/// Derive the simplified identifier from a display name
pub fn normalize_key(title: &str) -> String {
    title.replace(' ', "")
}

/// Reassign ids densely in list order
pub fn renumber(channels: &mut [Channel]) {
    for (idx, channel) in channels.iter_mut().enumerate() {
        channel.id = idx;
    }
}

// =============================================================================
// Cache Models
// =============================================================================

/// Where a cached snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    External,
    Builtin,
}

impl SourceKind {
    /// Token written to the metadata file
    pub fn as_token(&self) -> &'static str {
        match self {
            SourceKind::External => "EXTERNAL",
            SourceKind::Builtin => "BUILTIN",
        }
    }

    /// Human-readable label for status output
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::External => "External playlist",
            SourceKind::Builtin => "Built-in channels",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "EXTERNAL" | "EXTERNAL_M3U" => Ok(SourceKind::External),
            "BUILTIN" => Ok(SourceKind::Builtin),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Metadata stored next to a cached channel snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub source_kind: SourceKind,
    /// Snapshot creation time, millis since epoch
    pub timestamp: i64,
    /// Informational only, never checked against the snapshot
    pub channel_count: usize,
    /// Empty for built-in snapshots
    pub origin_path: String,
}

impl CacheMetadata {
    /// Age of the snapshot at `now_ms`, clamped at zero
    pub fn age_millis(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp).max(0)
    }

    /// Encode as `kind|timestamp|count|origin`
    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.source_kind.as_token(),
            self.timestamp,
            self.channel_count,
            self.origin_path
        )
    }

    /// Decode a metadata line; needs at least kind, timestamp and count
    pub fn parse_line(line: &str) -> Result<Self, String> {
        // origin may itself contain '|'
        let parts: Vec<&str> = line.trim().splitn(4, '|').collect();
        if parts.len() < 3 {
            return Err(format!("expected at least 3 fields, got {}", parts.len()));
        }

        let source_kind = parts[0].parse::<SourceKind>()?;
        let timestamp = parts[1]
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("bad timestamp {:?}: {}", parts[1], e))?;
        let channel_count = parts[2].trim().parse::<usize>().unwrap_or(0);
        let origin_path = parts.get(3).map(|s| s.to_string()).unwrap_or_default();

        Ok(Self {
            source_kind,
            timestamp,
            channel_count,
            origin_path,
        })
    }
}

// =============================================================================
// External Source Models
// =============================================================================

/// Filesystem state of the external playlist, for status display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSourceInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Millis since epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,
}

impl ExternalSourceInfo {
    /// Info for a path that does not exist
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exists: false,
            size: None,
            last_modified: None,
            readable: None,
        }
    }
}

impl fmt::Display for ExternalSourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.exists {
            return write!(f, "{} (not found)", self.path);
        }
        let kb = self.size.unwrap_or(0) / 1024;
        let modified = self
            .last_modified
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        write!(f, "{}\nSize: {} KB\nUpdated: {}", self.path, kb, modified)?;
        if self.readable == Some(false) {
            write!(f, "\n(not readable)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_strips_spaces() {
        assert_eq!(normalize_key("CCTV 1 综合"), "CCTV1综合");
        assert_eq!(normalize_key("NoSpaces"), "NoSpaces");
    }

    #[test]
    fn test_channel_new_defaults() {
        let ch = Channel::new(3, "BBC One", "http://a/b", "News");
        assert_eq!(ch.key, "BBCOne");
        assert_eq!(ch.primary_url(), Some("http://a/b"));
        assert!(ch.logo_url.is_empty());
        assert!(!ch.auth.needs_token);
        assert!(ch.is_playable());
    }

    #[test]
    fn test_renumber() {
        let mut list = vec![
            Channel::new(7, "A", "u", "g"),
            Channel::new(2, "B", "u", "g"),
        ];
        renumber(&mut list);
        assert_eq!(list[0].id, 0);
        assert_eq!(list[1].id, 1);
    }

    #[test]
    fn test_source_kind_tokens() {
        assert_eq!(SourceKind::External.to_string(), "EXTERNAL");
        assert_eq!("BUILTIN".parse::<SourceKind>(), Ok(SourceKind::Builtin));
        assert_eq!(
            "EXTERNAL_M3U".parse::<SourceKind>(),
            Ok(SourceKind::External)
        );
        assert!("NETWORK".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_metadata_line_round_trip() {
        let meta = CacheMetadata {
            source_kind: SourceKind::External,
            timestamp: 1_700_000_000_000,
            channel_count: 42,
            origin_path: "/tmp/channels.m3u".to_string(),
        };
        let line = meta.to_line();
        assert_eq!(line, "EXTERNAL|1700000000000|42|/tmp/channels.m3u");
        assert_eq!(CacheMetadata::parse_line(&line), Ok(meta));
    }

    #[test]
    fn test_metadata_parse_lenient_count_strict_timestamp() {
        let meta = CacheMetadata::parse_line("BUILTIN|123|abc").unwrap();
        assert_eq!(meta.channel_count, 0);
        assert_eq!(meta.origin_path, "");

        assert!(CacheMetadata::parse_line("BUILTIN|soon|3|").is_err());
        assert!(CacheMetadata::parse_line("BUILTIN|123").is_err());
        assert!(CacheMetadata::parse_line("OTHER|123|3|").is_err());
    }

    #[test]
    fn test_external_info_display_missing() {
        let info = ExternalSourceInfo::missing("/x/channels.m3u");
        assert_eq!(info.to_string(), "/x/channels.m3u (not found)");
    }
}

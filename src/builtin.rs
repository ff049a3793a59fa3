//! Built-in default channels
//!
//! A JSON array of channel definitions ships inside the binary. A file on
//! disk can stand in for it (config `builtin_path`).

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{normalize_key, renumber, AuthFields, Channel, DEFAULT_GROUP};

/// Channel definitions compiled into the binary
pub const BUNDLED_CHANNELS: &str = include_str!("../assets/channels.json");

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("failed to read built-in channels: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid built-in channel data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the built-in channel list is read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BuiltinSource {
    #[default]
    Bundled,
    File(PathBuf),
}

impl BuiltinSource {
    /// Read and decode the definitions
    pub async fn read(&self) -> Result<Vec<Channel>, BuiltinError> {
        match self {
            BuiltinSource::Bundled => decode(BUNDLED_CHANNELS),
            BuiltinSource::File(path) => {
                let json = tokio::fs::read_to_string(path).await?;
                decode(&json)
            }
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            BuiltinSource::Bundled => "bundled".to_string(),
            BuiltinSource::File(path) => path.display().to_string(),
        }
    }
}

/// One entry of the built-in JSON array
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuiltinEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    vid: String,
    #[serde(default)]
    video_url: Vec<String>,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    logo: String,
    #[serde(default)]
    pid: String,
    #[serde(default)]
    sid: String,
    #[serde(default)]
    program_id: String,
    #[serde(default)]
    need_token: bool,
    #[serde(default)]
    must_token: bool,
}

impl BuiltinEntry {
    /// Convert to our Channel model
    fn into_channel(self) -> Channel {
        let key = if self.vid.is_empty() {
            normalize_key(&self.title)
        } else {
            self.vid
        };
        let group = if self.channel.is_empty() {
            DEFAULT_GROUP.to_string()
        } else {
            self.channel
        };

        Channel {
            id: 0,
            title: self.title,
            key,
            stream_urls: self.video_url.into_iter().filter(|u| !u.is_empty()).collect(),
            group,
            logo_url: self.logo,
            auth: AuthFields {
                pid: self.pid,
                sid: self.sid,
                program_id: self.program_id,
                needs_token: self.need_token,
                must_have_token: self.must_token,
            },
        }
    }
}

/// Decode built-in JSON, dropping unplayable entries and renumbering
pub fn decode(json: &str) -> Result<Vec<Channel>, BuiltinError> {
    let entries: Vec<BuiltinEntry> = serde_json::from_str(json)?;
    let mut channels: Vec<Channel> = entries
        .into_iter()
        .map(BuiltinEntry::into_channel)
        .filter(Channel::is_playable)
        .collect();
    renumber(&mut channels);
    Ok(channels)
}

//! CLI Command Handlers
//!
//! Each handler takes its CLI args, the loaded config and Output, and
//! returns an ExitCode.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{
    ClearCmd, ExitCode, ImportCmd, ImportResponse, LoadCmd, LoadResponse, Output, ParseCmd,
    StatsCmd, StatsResponse, StatusCmd, StatusOk, StatusResponse,
};
use crate::config::Config;
use crate::loader::LoadOutcome;
use crate::models::Channel;
use crate::playlist;

// =============================================================================
// Load Command
// =============================================================================

pub async fn load_cmd(cmd: LoadCmd, config: &Config, output: &Output) -> ExitCode {
    let loader = config.loader();

    output.info(if cmd.allow_cache() {
        "Loading channels (cache allowed)..."
    } else {
        "Loading channels (cache bypassed)..."
    });

    let (mut channels, source) = loader.load_with_outcome(cmd.allow_cache()).await;
    if channels.is_empty() {
        return output.error("No channels available from any source", ExitCode::NoChannels);
    }

    let count = channels.len();
    if let Some(limit) = cmd.limit {
        channels.truncate(limit);
    }

    let text = format!(
        "{}\n\n{} channels from {}",
        channel_lines(&channels),
        count,
        outcome_label(source)
    );
    let response = LoadResponse {
        source,
        count,
        channels,
    };
    if let Err(e) = output.print(response, text) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

fn outcome_label(outcome: LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Cache => "cache",
        LoadOutcome::External => "external playlist",
        LoadOutcome::Builtin => "built-in channels",
        LoadOutcome::Exhausted => "nowhere",
    }
}

fn channel_lines(channels: &[Channel]) -> String {
    channels
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Status / Stats / Clear Commands
// =============================================================================

pub async fn status_cmd(_cmd: StatusCmd, config: &Config, output: &Output) -> ExitCode {
    let loader = config.loader();
    let cache = loader.cache();

    let has_external_source = loader.has_external_source().await;
    let external = loader.external_source_info().await;
    let cache_meta = cache.load_metadata().await.ok();
    let cache_stats = cache.stats().await;

    let active = if has_external_source {
        "External playlist"
    } else {
        "Built-in channels (no external playlist configured)"
    };
    let text = format!(
        "Active source: {}\n\nExternal playlist:\n{}\n\nCache ({}):\n{}",
        active,
        external,
        cache.dir().display(),
        cache_stats
    );

    let response = StatusResponse {
        has_external_source,
        external,
        cache: cache_meta,
        cache_stats,
    };
    if let Err(e) = output.print(response, text) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

pub async fn stats_cmd(_cmd: StatsCmd, config: &Config, output: &Output) -> ExitCode {
    let stats = config.cache_store().stats().await;
    let text = stats.clone();
    if let Err(e) = output.print(StatsResponse { stats }, text) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

pub async fn clear_cmd(_cmd: ClearCmd, config: &Config, output: &Output) -> ExitCode {
    let store = config.cache_store();
    match store.clear().await {
        Ok(()) => {
            if let Err(e) = output.print(StatusOk::default(), "Cache cleared") {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Failed to clear cache: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Parse Command
// =============================================================================

pub async fn parse_cmd(cmd: ParseCmd, output: &Output) -> ExitCode {
    let mut channels = match read_playlist(&cmd.file).await {
        Ok(channels) => channels,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    let count = channels.len();
    if let Some(limit) = cmd.limit {
        channels.truncate(limit);
    }

    let text = format!("{}\n\n{} channels parsed", channel_lines(&channels), count);
    if let Err(e) = output.print(&channels, text) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

async fn read_playlist(path: &Path) -> Result<Vec<Channel>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(playlist::parse(&String::from_utf8_lossy(&bytes)))
}

// =============================================================================
// Import Command
// =============================================================================

pub async fn import_cmd(cmd: ImportCmd, config: &Config, output: &Output) -> ExitCode {
    let target = cmd.output.clone().unwrap_or_else(|| config.external_path());
    let max = cmd.max.unwrap_or_else(|| config.max_channels());

    let mut channels = match read_playlist(&cmd.file).await {
        Ok(channels) => channels,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };
    if channels.is_empty() {
        return output.error(
            format!("No channels found in {}", cmd.file.display()),
            ExitCode::NoChannels,
        );
    }

    let parsed = channels.len();
    channels = prepare_import(channels, &config.priority_keywords(), max);
    let written = channels.len();

    let body = playlist::render(&channels);
    if let Err(e) = write_atomic(&target, body).await {
        return output.error(format!("{:#}", e), ExitCode::Error);
    }
    info!(
        "Imported {} of {} channels into {}",
        written,
        parsed,
        target.display()
    );

    let text = format!(
        "Wrote {} of {} channels to {}",
        written,
        parsed,
        target.display()
    );
    let response = ImportResponse {
        path: target.display().to_string(),
        parsed,
        written,
    };
    if let Err(e) = output.print(response, text) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

/// Order by keyword priority, then keep the first `max`
pub fn prepare_import(mut channels: Vec<Channel>, keywords: &[String], max: usize) -> Vec<Channel> {
    playlist::prioritize(&mut channels, keywords);
    channels.truncate(max);
    channels
}

/// Write via a temp file in the target directory, then rename over it
pub async fn write_atomic(target: &Path, body: String) -> Result<()> {
    let target = target.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut tmp = tempfile::Builder::new()
            .suffix(".m3u")
            .tempfile_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(body.as_bytes())
            .context("Failed to write playlist")?;
        tmp.persist(&target)
            .with_context(|| format!("Failed to move playlist into {}", target.display()))?;
        Ok(())
    })
    .await
    .context("Playlist writer task failed")?
}

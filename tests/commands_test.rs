//! Command Handler Tests
//!
//! Drives the handlers end to end against temp directories with JSON
//! output enabled.

use std::path::PathBuf;

use chanlist::cli::{ClearCmd, ExitCode, ImportCmd, LoadCmd, Output, ParseCmd, StatsCmd};
use chanlist::commands;
use chanlist::config::Config;
use chanlist::playlist;

const PLAYLIST: &str = "#EXTM3U\n\
#EXTINF:-1 group-title=\"Shop\",Shopping\nhttp://shop\n\
#EXTINF:-1 group-title=\"News\",BBC News\nhttp://bbc\n\
#EXTINF:-1 group-title=\"央视\",CCTV 13\nhttp://cctv13\n";

fn quiet_json() -> Output {
    Output {
        json: true,
        quiet: true,
    }
}

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        cache_dir: Some(dir.join("cache")),
        external_path: Some(dir.join("external.m3u")),
        builtin_path: Some(dir.join("missing-builtin.json")),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_import_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let source = dir.path().join("download.m3u");
    std::fs::write(&source, PLAYLIST).unwrap();

    let code = commands::import_cmd(
        ImportCmd {
            file: source,
            max: Some(2),
            output: None,
        },
        &config,
        &quiet_json(),
    )
    .await;
    assert_eq!(code, ExitCode::Success);

    let written = std::fs::read_to_string(config.external_path()).unwrap();
    let titles: Vec<String> = playlist::parse(&written)
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(titles, vec!["CCTV 13".to_string(), "BBC News".to_string()]);

    let code = commands::load_cmd(
        LoadCmd {
            no_cache: true,
            limit: None,
        },
        &config,
        &quiet_json(),
    )
    .await;
    assert_eq!(code, ExitCode::Success);
    assert!(config.cache_store().metadata_path().exists());
}

#[tokio::test]
async fn test_load_with_nothing_available() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let code = commands::load_cmd(
        LoadCmd {
            no_cache: false,
            limit: Some(3),
        },
        &config,
        &quiet_json(),
    )
    .await;
    assert_eq!(code, ExitCode::NoChannels);
}

#[tokio::test]
async fn test_import_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let code = commands::import_cmd(
        ImportCmd {
            file: PathBuf::from("/nonexistent/playlist.m3u"),
            max: None,
            output: None,
        },
        &config,
        &quiet_json(),
    )
    .await;
    assert_eq!(code, ExitCode::InvalidArgs);
    assert!(!config.external_path().exists());
}

#[tokio::test]
async fn test_parse_stats_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let source = dir.path().join("list.m3u");
    std::fs::write(&source, PLAYLIST).unwrap();

    let code = commands::parse_cmd(
        ParseCmd {
            file: source,
            limit: Some(1),
        },
        &quiet_json(),
    )
    .await;
    assert_eq!(code, ExitCode::Success);
    // parsing alone never writes the cache
    assert!(!config.cache_store().metadata_path().exists());

    assert_eq!(
        commands::stats_cmd(StatsCmd {}, &config, &quiet_json()).await,
        ExitCode::Success
    );
    assert_eq!(
        commands::clear_cmd(ClearCmd {}, &config, &quiet_json()).await,
        ExitCode::Success
    );
    assert_eq!(
        commands::clear_cmd(ClearCmd {}, &config, &quiet_json()).await,
        ExitCode::Success
    );
}

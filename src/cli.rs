//! CLI - Command Line Interface for chanlist
//!
//! The status/settings surface of the channel loader. Every command can
//! emit JSON for scripting.
//!
//! # Examples
//!
//! ```bash
//! # Resolve channels through cache -> external -> built-in
//! chanlist load
//! chanlist load --no-cache --json
//!
//! # Inspect and reset the cache
//! chanlist status
//! chanlist clear
//!
//! # Install a playlist as the external source
//! chanlist import ~/Downloads/index.m3u --max 200
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::loader::LoadOutcome;
use crate::models::{CacheMetadata, Channel, ExternalSourceInfo};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Load finished with an empty channel list
    NoChannels = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// chanlist - channel list loader and cache inspector
#[derive(Parser, Debug)]
#[command(
    name = "chanlist",
    version,
    about = "Resolve TV channel lists from cache, playlist file or built-in defaults",
    after_help = "EXAMPLES:\n\
                  chanlist load                       Load channels (cache first)\n\
                  chanlist load --no-cache            Skip the cache\n\
                  chanlist status --json              Cache and source status\n\
                  chanlist import index.m3u           Install an external playlist"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the channel list through the fallback chain
    #[command(visible_alias = "l")]
    Load(LoadCmd),

    /// Show external playlist and cache status
    #[command(visible_alias = "st")]
    Status(StatusCmd),

    /// Print cache statistics
    Stats(StatsCmd),

    /// Delete the cached channel list
    Clear(ClearCmd),

    /// Parse a playlist file without touching the cache
    #[command(visible_alias = "p")]
    Parse(ParseCmd),

    /// Prioritize a playlist and install it as the external source
    #[command(visible_alias = "i")]
    Import(ImportCmd),
}

/// Load channels (cache, then external playlist, then built-in)
#[derive(Args, Debug)]
pub struct LoadCmd {
    /// Ignore the cache and reload from sources
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of channels to print
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

impl LoadCmd {
    pub fn allow_cache(&self) -> bool {
        !self.no_cache
    }
}

/// Show external playlist and cache status
#[derive(Args, Debug)]
pub struct StatusCmd {}

/// Print cache statistics
#[derive(Args, Debug)]
pub struct StatsCmd {}

/// Delete the cached channel list
#[derive(Args, Debug)]
pub struct ClearCmd {}

/// Parse a playlist file
#[derive(Args, Debug)]
pub struct ParseCmd {
    /// Playlist file (#EXTM3U)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Maximum number of channels to print
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// Install a playlist as the external source
#[derive(Args, Debug)]
pub struct ImportCmd {
    /// Playlist file (#EXTM3U) to import
    #[arg(required = true)]
    pub file: PathBuf,

    /// Keep at most this many channels (default from config)
    #[arg(long, short = 'm')]
    pub max: Option<usize>,

    /// Write here instead of the configured external path
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Status OK response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

/// Channels plus where they came from
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub source: LoadOutcome,
    pub count: usize,
    pub channels: Vec<Channel>,
}

/// Source and cache status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub has_external_source: bool,
    pub external: ExternalSourceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMetadata>,
    pub cache_stats: String,
}

/// Cache statistics text
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: String,
}

/// Result of an import
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub path: String,
    pub parsed: usize,
    pub written: usize,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print data as JSON, or the given text for humans
    pub fn print<T: Serialize>(&self, data: T, text: impl std::fmt::Display) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", text);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_command_defaults() {
        let cli = Cli::parse_from(["chanlist", "load"]);
        if let Command::Load(cmd) = cli.command {
            assert!(cmd.allow_cache());
            assert!(cmd.limit.is_none());
        } else {
            panic!("Expected Load command");
        }
    }

    #[test]
    fn test_load_no_cache() {
        let cli = Cli::parse_from(["chanlist", "load", "--no-cache", "-l", "5"]);
        if let Command::Load(cmd) = cli.command {
            assert!(!cmd.allow_cache());
            assert_eq!(cmd.limit, Some(5));
        } else {
            panic!("Expected Load command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "chanlist",
            "--json",
            "--quiet",
            "--config",
            "/etc/chanlist.toml",
            "status",
        ]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/chanlist.toml")));
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn test_import_with_options() {
        let cli = Cli::parse_from(["chanlist", "import", "in.m3u", "-m", "50", "-o", "out.m3u"]);
        if let Command::Import(cmd) = cli.command {
            assert_eq!(cmd.file, PathBuf::from("in.m3u"));
            assert_eq!(cmd.max, Some(50));
            assert_eq!(cmd.output, Some(PathBuf::from("out.m3u")));
        } else {
            panic!("Expected Import command");
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["chanlist"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NoChannels), 5);
    }

    #[test]
    fn test_json_error_output() {
        let out = JsonOutput::<()>::error_msg("boom", ExitCode::Error);
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"error":"boom","exit_code":1}"#);
    }
}

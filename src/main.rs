//! chanlist - TV channel list loader
//!
//! # Usage
//!
//! ```bash
//! chanlist load
//! chanlist status --json
//! chanlist clear
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chanlist::cli::{Cli, Command, ExitCode, Output};
use chanlist::commands;
use chanlist::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Log to stderr; RUST_LOG wins over the default filter
fn init_logging(verbose: bool, quiet: bool) {
    let default = match (verbose, quiet) {
        (true, _) => "chanlist=debug",
        (false, true) => "chanlist=warn",
        (false, false) => "chanlist=info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Command::Load(cmd) => commands::load_cmd(cmd, &config, &output).await,
        Command::Status(cmd) => commands::status_cmd(cmd, &config, &output).await,
        Command::Stats(cmd) => commands::stats_cmd(cmd, &config, &output).await,
        Command::Clear(cmd) => commands::clear_cmd(cmd, &config, &output).await,
        Command::Parse(cmd) => commands::parse_cmd(cmd, &output).await,
        Command::Import(cmd) => commands::import_cmd(cmd, &config, &output).await,
    }
}

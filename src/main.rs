//! plzcache - build output cache and cleaner
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use plzcache::cli::{Cli, Commands};
use plzcache::config::{Config, ConfigManager};
use plzcache::error::{PlzError, PlzResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PlzResult<()> {
    let cli = Cli::parse();

    let workspace =
        std::env::current_dir().map_err(|e| PlzError::io("getting current directory", e))?;

    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(PlzError::ConfigNotFound(path.clone()));
        }
    }
    let config_manager = ConfigManager::for_workspace(cli.config.clone(), &workspace);
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Clean(args) => plzcache::cli::commands::clean(args, &config, &workspace).await,
        Commands::Store(args) => plzcache::cli::commands::store(args, &config, &workspace).await,
        Commands::Retrieve(args) => {
            plzcache::cli::commands::retrieve(args, &config, &workspace).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("plzcache=warn"),
        1 => EnvFilter::new("plzcache=info"),
        _ => EnvFilter::new("plzcache=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}

//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// plzcache - build output cache and cleaner
///
/// Stores and restores build outputs through an asynchronous cache and
/// cleans output trees, optionally in the background.
#[derive(Parser, Debug)]
#[command(name = "plzcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PLZCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean build outputs and cache entries
    Clean(CleanArgs),

    /// Store a target's outputs in the cache
    Store(StoreArgs),

    /// Restore a target's outputs from the cache
    Retrieve(RetrieveArgs),
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Targets to clean (default: everything)
    pub labels: Vec<String>,

    /// Remove the output tree in the background and return immediately
    #[arg(long, conflicts_with = "labels")]
    pub background: bool,

    /// Leave cache entries alone
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the store command
#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// Target the outputs belong to
    pub label: String,

    /// Hex cache key (default: hash of the label and file contents)
    #[arg(long)]
    pub key: Option<String>,

    /// Output files, relative to the workspace root
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the retrieve command
#[derive(Parser, Debug)]
pub struct RetrieveArgs {
    /// Target to restore
    pub label: String,

    /// Hex cache key the outputs were stored under
    #[arg(long)]
    pub key: String,

    /// Output files to restore, relative to the workspace root
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clean_everything() {
        let cli = Cli::parse_from(["plzcache", "clean", "--background"]);
        match cli.command {
            Commands::Clean(args) => {
                assert!(args.labels.is_empty());
                assert!(args.background);
                assert!(!args.no_cache);
            }
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn parse_clean_targets() {
        let cli = Cli::parse_from(["plzcache", "-vv", "clean", "//src:a", "//src:b", "--no-cache"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Clean(args) => {
                assert_eq!(args.labels, vec!["//src:a", "//src:b"]);
                assert!(args.no_cache);
            }
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn background_only_for_whole_clean() {
        assert!(Cli::try_parse_from(["plzcache", "clean", "//src:a", "--background"]).is_err());
    }

    #[test]
    fn store_needs_files() {
        assert!(Cli::try_parse_from(["plzcache", "store", "//src:a"]).is_err());

        let cli = Cli::parse_from(["plzcache", "store", "//src:a", "--key", "ab12", "out.txt"]);
        match cli.command {
            Commands::Store(args) => {
                assert_eq!(args.key.as_deref(), Some("ab12"));
                assert_eq!(args.files, vec![PathBuf::from("out.txt")]);
            }
            _ => panic!("expected store"),
        }
    }

    #[test]
    fn retrieve_needs_key() {
        assert!(Cli::try_parse_from(["plzcache", "retrieve", "//src:a", "out.txt"]).is_err());
    }
}

//! Configuration schema for plzcache
//!
//! Configuration is read from `.plzcache.toml` in the workspace, falling
//! back to `~/.config/plzcache/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Build output settings
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable artifact caching (default: true)
    pub enabled: bool,

    /// Directory holding cache entries
    pub dir: PathBuf,

    /// Background store workers (0 = store synchronously)
    pub workers: usize,

    /// Stores that may wait in the queue while all workers are busy
    ///
    /// Raised to 1 if set to 0: there is no unbuffered hand-off, so with
    /// every worker busy `workers + queue_depth` stores are accepted before
    /// callers start to block.
    pub queue_depth: usize,

    /// Wait for queued stores before cleaning the cache
    pub flush_before_clean: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            enabled: true,
            dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("plzcache"),
            workers: cpus + 2,
            queue_depth: 1,
            flush_before_clean: false,
        }
    }
}

/// Build output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output directory, relative to the workspace
    pub out_dir: PathBuf,

    /// Build graph manifest, relative to the workspace
    pub graph: PathBuf,

    /// Only clean targets carrying one of these labels (empty = all)
    pub include: Vec<String>,

    /// Never clean targets carrying one of these labels
    pub exclude: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("plz-out"),
            graph: PathBuf::from("graph.toml"),
            include: vec![],
            exclude: vec![],
        }
    }
}

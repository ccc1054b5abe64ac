//! Configuration management for plzcache

pub mod schema;

pub use schema::Config;

use crate::error::{PlzError, PlzResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the workspace-local config file
pub const LOCAL_CONFIG_FILE: &str = ".plzcache.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Pick the config for a workspace
    ///
    /// An explicit path wins, then `.plzcache.toml` in the workspace, then
    /// the user config.
    pub fn for_workspace(explicit: Option<PathBuf>, workspace: &Path) -> Self {
        if let Some(path) = explicit {
            return Self::with_path(path);
        }

        let local = workspace.join(LOCAL_CONFIG_FILE);
        if local.exists() {
            debug!("Found local config: {}", local.display());
            return Self::with_path(local);
        }

        Self::new()
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plzcache")
            .join("config.toml")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> PlzResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> PlzResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PlzError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| PlzError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

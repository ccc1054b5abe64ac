//! Error types for plzcache
//!
//! All modules use `PlzResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plzcache operations
pub type PlzResult<T> = Result<T, PlzError>;

/// All errors that can occur in plzcache
#[derive(Error, Debug)]
pub enum PlzError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // Build graph errors
    #[error("Invalid build label: {label}: {reason}")]
    InvalidLabel { label: String, reason: String },

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid output {path} of {target}: {reason}")]
    InvalidOutput {
        target: String,
        path: String,
        reason: String,
    },

    #[error("Duplicate target in build graph: {0}")]
    DuplicateTarget(String),

    #[error("Failed to read build graph {path}: {reason}")]
    GraphRead { path: PathBuf, reason: String },

    // Cache errors
    #[error("Cache is shut down; store for {0} was not accepted")]
    CacheShutDown(String),

    #[error("Cache is disabled")]
    CacheDisabled,

    #[error("Cache miss for {0}")]
    CacheMiss(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Invalid cache path {path}: {reason}")]
    CachePathInvalid { path: PathBuf, reason: String },

    #[error("Cache output missing for {target}: {path}")]
    CacheOutputMissing { target: String, path: PathBuf },

    // Clean errors
    #[error("Failed to remove outputs of {target}: {source}")]
    RemoveOutputs {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove test outputs of {target}: {source}")]
    RemoveTestOutputs {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clean path {path}: {source}")]
    RemovePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to schedule background removal of {path}: {reason}")]
    ScheduleRemove { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlzError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid label error
    pub fn invalid_label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from removing build outputs
    ///
    /// These are the conditions a clean treats as fatal.
    pub fn is_removal_failure(&self) -> bool {
        matches!(
            self,
            Self::RemoveOutputs { .. } | Self::RemoveTestOutputs { .. } | Self::RemovePath { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PackageNotFound(_) | Self::TargetNotFound(_) => {
                Some("Check the label against the build graph manifest")
            }
            Self::CacheDisabled => Some("Set `enabled = true` under [cache] in the config"),
            Self::InvalidOutput { .. } => {
                Some("Outputs are paths inside the package's output directory")
            }
            Self::InvalidKey(_) => Some("Keys are hex encoded, e.g. --key 9f86d081"),
            Self::RemovePath { .. } | Self::RemoveOutputs { .. } => {
                Some("Check that nothing else holds files open under the output directory")
            }
            _ => None,
        }
    }
}

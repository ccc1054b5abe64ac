//! Build targets and the metadata recorded for a completed build action

use crate::build::label::BuildLabel;
use crate::build::paths;
use crate::error::{PlzError, PlzResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A single buildable target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Target label
    pub label: BuildLabel,

    /// Whether this is a test target
    #[serde(default)]
    pub test: bool,

    /// Declared outputs, relative to the package output directory
    #[serde(default, rename = "outs")]
    pub outputs: Vec<String>,

    /// Free-form tags used by include/exclude policies
    #[serde(default, rename = "labels")]
    pub tags: BTreeSet<String>,
}

impl BuildTarget {
    /// Create a target with no outputs
    pub fn new(label: BuildLabel) -> Self {
        Self {
            label,
            test: false,
            outputs: vec![],
            tags: BTreeSet::new(),
        }
    }

    /// Add declared outputs
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(outputs.into_iter().map(Into::into));
        self
    }

    /// Mark as a test target
    pub fn as_test(mut self) -> Self {
        self.test = true;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Whether the target carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Check the label and that every output stays inside the package's
    /// output directory
    pub fn validate(&self) -> PlzResult<()> {
        self.label.validate()?;
        for out in &self.outputs {
            paths::check_relative(Path::new(out)).map_err(|reason| PlzError::InvalidOutput {
                target: self.label.to_string(),
                path: out.clone(),
                reason: reason.to_string(),
            })?;
        }
        Ok(())
    }

    /// Output paths relative to an output root (`<package>/<out>`)
    pub fn output_paths(&self) -> Vec<PathBuf> {
        let pkg = Path::new(&self.label.package);
        self.outputs.iter().map(|out| pkg.join(out)).collect()
    }
}

/// Descriptor of a completed build action, stored alongside cached files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Exit status of the build action
    pub exit_code: i32,

    /// Outputs the action produced
    #[serde(default)]
    pub outputs: Vec<String>,

    /// When the action started
    pub start_time: DateTime<Utc>,

    /// How long the action took
    pub duration_ms: u64,

    /// Captured standard output, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

impl BuildMetadata {
    /// Metadata for a successful action that started now
    pub fn success(outputs: Vec<String>) -> Self {
        Self {
            exit_code: 0,
            outputs,
            start_time: Utc::now(),
            duration_ms: 0,
            stdout: None,
        }
    }

    /// Whether the action succeeded
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

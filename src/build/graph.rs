//! In-memory build graph
//!
//! The graph is loaded from a TOML manifest listing every target:
//!
//! ```toml
//! [[target]]
//! label = "//src/core:core"
//! outs = ["core.a"]
//!
//! [[target]]
//! label = "//src/core:_core#srcs"
//! ```

use crate::build::label::BuildLabel;
use crate::build::target::BuildTarget;
use crate::error::{PlzError, PlzResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// All targets declared in one package
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Package path
    pub name: String,
    targets: BTreeMap<String, Arc<BuildTarget>>,
}

impl Package {
    /// Create an empty package
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: BTreeMap::new(),
        }
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&Arc<BuildTarget>> {
        self.targets.get(name)
    }

    /// All targets in the package, ordered by name
    pub fn targets(&self) -> impl Iterator<Item = &Arc<BuildTarget>> {
        self.targets.values()
    }

    /// The target plus every target in this package sharing its parent
    ///
    /// Results are ordered by label.
    pub fn all_children(&self, target: &BuildTarget) -> Vec<Arc<BuildTarget>> {
        let parent = target.label.parent();
        let mut children: Vec<Arc<BuildTarget>> = self
            .targets
            .values()
            .filter(|t| t.label.parent() == parent)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.label.cmp(&b.label));
        children
    }

    fn insert(&mut self, target: BuildTarget) -> PlzResult<()> {
        if self.targets.contains_key(&target.label.name) {
            return Err(PlzError::DuplicateTarget(target.label.to_string()));
        }
        self.targets
            .insert(target.label.name.clone(), Arc::new(target));
        Ok(())
    }
}

/// Read-only view of the repository's targets
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    packages: BTreeMap<String, Package>,
}

#[derive(Debug, Deserialize)]
struct GraphManifest {
    #[serde(default, rename = "target")]
    targets: Vec<BuildTarget>,
}

impl BuildGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a list of targets
    pub fn from_targets(targets: impl IntoIterator<Item = BuildTarget>) -> PlzResult<Self> {
        let mut graph = Self::new();
        for target in targets {
            graph.add_target(target)?;
        }
        Ok(graph)
    }

    /// Parse a graph manifest
    pub fn from_toml(content: &str) -> PlzResult<Self> {
        let manifest: GraphManifest = toml::from_str(content)?;
        Self::from_targets(manifest.targets)
    }

    /// Load a graph manifest from disk
    pub async fn load(path: &Path) -> PlzResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PlzError::GraphRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let manifest: GraphManifest =
            toml::from_str(&content).map_err(|e| PlzError::GraphRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let graph = Self::from_targets(manifest.targets)?;
        debug!(
            "Loaded build graph from {}: {} package(s), {} target(s)",
            path.display(),
            graph.packages.len(),
            graph.len()
        );
        Ok(graph)
    }

    /// Add a target, creating its package if needed
    ///
    /// Fails if the label or any output would resolve outside the output
    /// tree.
    pub fn add_target(&mut self, target: BuildTarget) -> PlzResult<()> {
        target.validate()?;
        let pkg = target.label.package.clone();
        self.packages
            .entry(pkg.clone())
            .or_insert_with(|| Package::new(pkg))
            .insert(target)
    }

    /// Package owning the given label
    pub fn package(&self, label: &BuildLabel) -> PlzResult<&Package> {
        self.packages
            .get(&label.package)
            .ok_or_else(|| PlzError::PackageNotFound(format!("//{}", label.package)))
    }

    /// Target with the given label
    pub fn target(&self, label: &BuildLabel) -> PlzResult<&Arc<BuildTarget>> {
        self.package(label)?
            .target(&label.name)
            .ok_or_else(|| PlzError::TargetNotFound(label.to_string()))
    }

    /// Total number of targets
    pub fn len(&self) -> usize {
        self.packages.values().map(|p| p.targets.len()).sum()
    }

    /// Whether the graph has no targets
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

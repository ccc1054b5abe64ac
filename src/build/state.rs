//! Shared state for a single invocation

use crate::build::graph::BuildGraph;
use crate::build::target::BuildTarget;
use crate::cache::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Layout of the build output tree
///
/// ```text
/// <root>/gen/<package>/<out>        generated outputs
/// <root>/bin/<package>/<name>/      binary outputs
/// <root>/test/<package>/<name>/     test results and coverage
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the output tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generated outputs root
    pub fn gen_dir(&self) -> PathBuf {
        self.root.join("gen")
    }

    /// Binary output directory for a target
    pub fn bin_dir(&self, target: &BuildTarget) -> PathBuf {
        self.root
            .join("bin")
            .join(&target.label.package)
            .join(&target.label.name)
    }

    /// Test output directory for a target
    pub fn test_dir(&self, target: &BuildTarget) -> PathBuf {
        self.root
            .join("test")
            .join(&target.label.package)
            .join(&target.label.name)
    }

    /// Absolute locations of a target's declared outputs
    pub fn output_paths(&self, target: &BuildTarget) -> Vec<PathBuf> {
        let gen_root = self.gen_dir();
        target
            .output_paths()
            .into_iter()
            .map(|p| gen_root.join(p))
            .collect()
    }
}

/// Everything an operation needs to know about the current build
pub struct BuildState {
    /// The target graph
    pub graph: BuildGraph,

    /// Cache in use, if caching is enabled
    pub cache: Option<Arc<dyn Cache>>,

    /// Output tree layout
    pub layout: OutputLayout,

    /// Only act on targets carrying one of these tags (empty = all)
    pub include: Vec<String>,

    /// Never act on targets carrying one of these tags
    pub exclude: Vec<String>,
}

impl BuildState {
    /// Create state with no cache and no inclusion policy
    pub fn new(graph: BuildGraph, layout: OutputLayout) -> Self {
        Self {
            graph,
            cache: None,
            layout,
            include: vec![],
            exclude: vec![],
        }
    }

    /// Attach a cache
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the include/exclude policy
    pub fn with_policy(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include = include;
        self.exclude = exclude;
        self
    }

    /// Whether the inclusion policy accepts this target
    pub fn should_include(&self, target: &BuildTarget) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|tag| target.has_tag(tag));
        included && !self.exclude.iter().any(|tag| target.has_tag(tag))
    }
}

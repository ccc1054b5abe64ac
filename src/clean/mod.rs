//! Cleaning build artifacts
//!
//! Removes the whole output tree or the outputs of selected targets,
//! optionally invalidating their cache entries too. Any failure to remove
//! something is returned as an error; callers treat it as fatal.
//!
//! Cache invalidation does not wait for stores still queued on an
//! [`AsyncCache`](crate::cache::AsyncCache) unless `flush_cache` is set, so
//! without it a queued store can repopulate an entry after the clean.

pub mod fs;

pub use fs::{ArtifactRemover, FsArtifacts};

use crate::build::{BuildLabel, BuildState, BuildTarget};
use crate::cache::Cache;
use crate::error::PlzResult;
use std::path::Path;
use tracing::{debug, info, warn};

/// How a whole-tree clean finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    /// The output tree was removed before returning
    Removed,
    /// Removal continues in the background
    Backgrounded,
}

/// Clean the entire output directory and, if given, the cache
///
/// With `background`, removal of `out_dir` is handed off and this returns
/// immediately; if that can't be arranged it falls back to removing the
/// tree synchronously.
pub async fn clean(
    out_dir: &Path,
    cache: Option<&dyn Cache>,
    remover: &dyn ArtifactRemover,
    background: bool,
    flush_cache: bool,
) -> PlzResult<CleanOutcome> {
    if let Some(cache) = cache {
        if flush_cache {
            cache.flush().await;
        }
        cache.clean_all().await?;
    }

    if background {
        match remover.schedule_remove_dir(out_dir).await {
            Ok(()) => {
                info!("Cleaning {} in background", out_dir.display());
                return Ok(CleanOutcome::Backgrounded);
            }
            Err(e) => {
                warn!(
                    "Couldn't run clean in background; will do it synchronously: {}",
                    e
                );
            }
        }
    }

    remover.remove_dir(out_dir).await?;
    Ok(CleanOutcome::Removed)
}

/// Clean the given targets and all of their subtargets
///
/// Returns the number of targets cleaned.
pub async fn clean_targets(
    state: &BuildState,
    remover: &dyn ArtifactRemover,
    labels: &[BuildLabel],
    clean_cache: bool,
    flush_cache: bool,
) -> PlzResult<usize> {
    let cache = if clean_cache { state.cache.as_deref() } else { None };
    if flush_cache {
        if let Some(cache) = cache {
            cache.flush().await;
        }
    }

    let mut cleaned = 0;
    for label in labels {
        // Subtargets are walked per label, so a package may be scanned more
        // than once when several of its targets are requested.
        let package = state.graph.package(label)?;
        let target = state.graph.target(label)?;

        for child in package.all_children(target) {
            if !state.should_include(&child) {
                debug!("Skipping {} (excluded)", child.label);
                continue;
            }
            clean_target(remover, cache, &child).await?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}

async fn clean_target(
    remover: &dyn ArtifactRemover,
    cache: Option<&dyn Cache>,
    target: &BuildTarget,
) -> PlzResult<()> {
    debug!("Cleaning {}", target.label);
    remover.remove_outputs(target).await?;
    if target.test {
        remover.remove_test_outputs(target).await?;
    }
    if let Some(cache) = cache {
        cache.clean(target).await?;
    }
    Ok(())
}

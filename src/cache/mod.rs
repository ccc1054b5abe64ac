//! Build artifact caching
//!
//! Outputs of a build action are stored keyed by a fingerprint of the
//! action's inputs and later retrieved to skip rebuilding unchanged targets.
//!
//! # Layers
//!
//! | Layer | Type | Behavior |
//! |-------|------|----------|
//! | Backend | [`DirCache`] | Synchronous store/retrieve against a directory |
//! | Proxy | [`AsyncCache`] | Queues stores onto a worker pool, passes everything else through |
//!
//! # Consistency
//!
//! A store is applied some time after [`Cache::store`] returns. `clean` and
//! `clean_all` do not wait for queued stores, so an entry stored just before
//! a clean may reappear once its worker gets to it. Call [`Cache::flush`]
//! first when that matters.

pub mod async_cache;
pub mod dir;
#[cfg(test)]
pub(crate) mod testing;

pub use async_cache::{AsyncCache, StoreRequest};
pub use dir::DirCache;

use crate::build::{BuildMetadata, BuildTarget};
use crate::config::schema::CacheConfig;
use crate::error::PlzResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Storage for build outputs keyed by target and fingerprint
///
/// Implementations must be safe to call concurrently: the async proxy
/// shares one backend between all of its workers and direct callers.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store a target's outputs and metadata under `key`
    ///
    /// `files` are paths relative to the workspace root and must exist
    /// when the store is applied.
    async fn store(
        &self,
        target: Arc<BuildTarget>,
        key: Vec<u8>,
        metadata: BuildMetadata,
        files: Vec<PathBuf>,
    ) -> PlzResult<()>;

    /// Restore a target's outputs, returning its metadata on a hit
    async fn retrieve(
        &self,
        target: &BuildTarget,
        key: &[u8],
        files: &[PathBuf],
    ) -> PlzResult<Option<BuildMetadata>>;

    /// Remove every cached entry for one target
    async fn clean(&self, target: &BuildTarget) -> PlzResult<()>;

    /// Remove the entire cache
    async fn clean_all(&self) -> PlzResult<()>;

    /// Wait for deferred stores to be applied
    ///
    /// A no-op for caches that store synchronously.
    async fn flush(&self) {}

    /// Release background resources, completing any deferred work
    async fn shutdown(&self) {}
}

/// Create the cache described by the config
///
/// # Returns
/// * `None` - Caching is disabled
/// * `Some(cache)` - A directory cache, wrapped in an [`AsyncCache`] when
///   `workers > 0`
pub fn new_cache(config: &CacheConfig, workspace: &Path) -> Option<Arc<dyn Cache>> {
    if !config.enabled {
        debug!("Caching disabled");
        return None;
    }

    let backend: Arc<dyn Cache> = Arc::new(DirCache::new(&config.dir, workspace));
    if config.workers == 0 {
        debug!("Using synchronous directory cache at {}", config.dir.display());
        return Some(backend);
    }

    Some(Arc::new(AsyncCache::new(backend, config)))
}

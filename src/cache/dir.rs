//! Directory-backed cache
//!
//! Entries live at `<root>/<package>/<name>/<hex key>/`, holding copies of
//! the stored files (at their workspace-relative paths) plus
//! `metadata.json`. Entries are written to a temporary sibling and renamed
//! into place, so a reader never sees a partially written entry.

use crate::build::paths;
use crate::build::{BuildMetadata, BuildTarget};
use crate::cache::Cache;
use crate::error::{PlzError, PlzResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

const METADATA_FILE: &str = "metadata.json";

/// Cache backend storing entries in a local directory
#[derive(Debug, Clone)]
pub struct DirCache {
    root: PathBuf,
    workspace: PathBuf,
}

impl DirCache {
    /// Create a cache at `root` for files relative to `workspace`
    pub fn new(root: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workspace: workspace.into(),
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_dir(&self, target: &BuildTarget) -> PlzResult<PathBuf> {
        // Labels built with `BuildLabel::new` skip parsing
        target.label.validate()?;
        Ok(self
            .root
            .join(&target.label.package)
            .join(&target.label.name))
    }

    fn entry_dir(&self, target: &BuildTarget, key: &[u8]) -> PlzResult<PathBuf> {
        Ok(self.target_dir(target)?.join(hex::encode(key)))
    }

    async fn write_entry(
        &self,
        target: &BuildTarget,
        staging: &Path,
        metadata: &BuildMetadata,
        files: &[PathBuf],
    ) -> PlzResult<()> {
        fs::create_dir_all(staging)
            .await
            .map_err(|e| PlzError::io(format!("creating {}", staging.display()), e))?;

        for file in files {
            let src = self.workspace.join(file);
            if !src.exists() {
                return Err(PlzError::CacheOutputMissing {
                    target: target.label.to_string(),
                    path: file.clone(),
                });
            }
            copy_path(&src, &staging.join(file))
                .await
                .map_err(|e| PlzError::io(format!("caching {}", src.display()), e))?;
        }

        let content = serde_json::to_string_pretty(metadata)?;
        let md_path = staging.join(METADATA_FILE);
        fs::write(&md_path, content)
            .await
            .map_err(|e| PlzError::io(format!("writing {}", md_path.display()), e))?;
        Ok(())
    }
}

#[async_trait]
impl Cache for DirCache {
    async fn store(
        &self,
        target: Arc<BuildTarget>,
        key: Vec<u8>,
        metadata: BuildMetadata,
        files: Vec<PathBuf>,
    ) -> PlzResult<()> {
        if key.is_empty() {
            return Err(PlzError::InvalidKey("empty key".to_string()));
        }
        for file in &files {
            check_relative(file)?;
        }

        let entry = self.entry_dir(&target, &key)?;
        let staging = self
            .target_dir(&target)?
            .join(format!(".tmp-{}", Uuid::new_v4()));

        if let Err(e) = self.write_entry(&target, &staging, &metadata, &files).await {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        if entry.exists() {
            fs::remove_dir_all(&entry)
                .await
                .map_err(|e| PlzError::io(format!("replacing {}", entry.display()), e))?;
        }
        fs::rename(&staging, &entry)
            .await
            .map_err(|e| PlzError::io(format!("finalizing {}", entry.display()), e))?;

        debug!(
            "Cached {} file(s) for {} under {}",
            files.len(),
            target.label,
            hex::encode(&key)
        );
        Ok(())
    }

    async fn retrieve(
        &self,
        target: &BuildTarget,
        key: &[u8],
        files: &[PathBuf],
    ) -> PlzResult<Option<BuildMetadata>> {
        let entry = self.entry_dir(target, key)?;
        let md_path = entry.join(METADATA_FILE);
        if !md_path.exists() {
            debug!("Cache miss for {}", target.label);
            return Ok(None);
        }

        for file in files {
            check_relative(file)?;
            if !entry.join(file).exists() {
                debug!(
                    "Cache entry for {} lacks {}; treating as miss",
                    target.label,
                    file.display()
                );
                return Ok(None);
            }
        }

        for file in files {
            let dst = self.workspace.join(file);
            copy_path(&entry.join(file), &dst)
                .await
                .map_err(|e| PlzError::io(format!("restoring {}", dst.display()), e))?;
        }

        let content = fs::read_to_string(&md_path)
            .await
            .map_err(|e| PlzError::io(format!("reading {}", md_path.display()), e))?;
        let metadata: BuildMetadata = serde_json::from_str(&content)?;

        debug!("Retrieved {} from cache", target.label);
        Ok(Some(metadata))
    }

    async fn clean(&self, target: &BuildTarget) -> PlzResult<()> {
        let dir = self.target_dir(target)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| PlzError::io(format!("cleaning {}", dir.display()), e))?;
            debug!("Cleaned cache entries for {}", target.label);
        }
        Ok(())
    }

    async fn clean_all(&self) -> PlzResult<()> {
        if self.root.exists() {
            info!("Cleaning cache directory {}", self.root.display());
            fs::remove_dir_all(&self.root)
                .await
                .map_err(|e| PlzError::io(format!("cleaning {}", self.root.display()), e))?;
        }
        Ok(())
    }
}

/// Reject stored file paths that would land outside the workspace
pub(crate) fn check_relative(path: &Path) -> PlzResult<()> {
    paths::check_relative(path).map_err(|reason| PlzError::CachePathInvalid {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

/// Copy a file or directory tree, creating parents as needed
async fn copy_path(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !fs::metadata(src).await?.is_dir() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(src, dst).await?;
        return Ok(());
    }

    let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from, to)) = stack.pop() {
        fs::create_dir_all(&to).await?;
        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let dest = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                stack.push((entry.path(), dest));
            } else {
                fs::copy(entry.path(), &dest).await?;
            }
        }
    }
    Ok(())
}

//! Filesystem removal of build outputs

use crate::build::{BuildTarget, OutputLayout};
use crate::error::{PlzError, PlzResult};
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Removes build artifacts from disk
#[async_trait]
pub trait ArtifactRemover: Send + Sync {
    /// Remove a target's declared and binary outputs
    async fn remove_outputs(&self, target: &BuildTarget) -> PlzResult<()>;

    /// Remove a test target's results
    async fn remove_test_outputs(&self, target: &BuildTarget) -> PlzResult<()>;

    /// Remove a directory tree, returning once it is gone
    async fn remove_dir(&self, path: &Path) -> PlzResult<()>;

    /// Arrange for a directory tree to be removed in the background
    ///
    /// `Ok` means removal was scheduled and the path is already free for
    /// reuse; it says nothing about when the files are actually deleted.
    async fn schedule_remove_dir(&self, path: &Path) -> PlzResult<()>;
}

/// [`ArtifactRemover`] for a local output tree
#[derive(Debug, Clone)]
pub struct FsArtifacts {
    layout: OutputLayout,
}

impl FsArtifacts {
    /// Create a remover for the given output layout
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl ArtifactRemover for FsArtifacts {
    async fn remove_outputs(&self, target: &BuildTarget) -> PlzResult<()> {
        target.validate()?;
        let mut paths = self.layout.output_paths(target);
        paths.push(self.layout.bin_dir(target));

        for path in &paths {
            remove_path(path).await.map_err(|e| PlzError::RemoveOutputs {
                target: target.label.to_string(),
                source: e,
            })?;
        }
        debug!("Removed outputs of {}", target.label);
        Ok(())
    }

    async fn remove_test_outputs(&self, target: &BuildTarget) -> PlzResult<()> {
        target.label.validate()?;
        remove_path(&self.layout.test_dir(target))
            .await
            .map_err(|e| PlzError::RemoveTestOutputs {
                target: target.label.to_string(),
                source: e,
            })?;
        debug!("Removed test outputs of {}", target.label);
        Ok(())
    }

    async fn remove_dir(&self, path: &Path) -> PlzResult<()> {
        if !path.exists() {
            return Ok(());
        }

        info!("Cleaning path {}", path.display());
        fs::remove_dir_all(path)
            .await
            .map_err(|e| PlzError::RemovePath {
                path: path.to_path_buf(),
                source: e,
            })
    }

    async fn schedule_remove_dir(&self, path: &Path) -> PlzResult<()> {
        if !path.exists() {
            return Ok(());
        }

        let schedule_err = |reason: String| PlzError::ScheduleRemove {
            path: path.to_path_buf(),
            reason,
        };

        let name = path
            .file_name()
            .ok_or_else(|| schedule_err("path has no final component".to_string()))?;
        let doomed = path.with_file_name(format!(
            ".{}.deleting-{}",
            name.to_string_lossy(),
            Uuid::new_v4()
        ));

        fs::rename(path, &doomed)
            .await
            .map_err(|e| schedule_err(e.to_string()))?;

        if let Err(e) = spawn_removal(&doomed) {
            // Put it back so a synchronous fallback still finds it
            if let Err(restore) = fs::rename(&doomed, path).await {
                warn!(
                    "Could not restore {} to {}: {}",
                    doomed.display(),
                    path.display(),
                    restore
                );
            }
            return Err(schedule_err(e.to_string()));
        }

        debug!("Removing {} in the background", doomed.display());
        Ok(())
    }
}

/// Remove a file or directory; a missing path is not an error
async fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

/// Start `rm -rf` in the background and reap it from a runtime task
///
/// The child isn't killed when the task is dropped, so removal carries on
/// after this process exits. Returns the child's pid.
#[cfg(unix)]
fn spawn_removal(path: &Path) -> io::Result<Option<u32>> {
    use std::process::Stdio;
    use tokio::process::Command;

    let mut child = Command::new("rm")
        .arg("-rf")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid = child.id();

    let path = path.to_path_buf();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!("Removed {}", path.display()),
            Ok(status) => warn!(
                "Background removal of {} exited with {}",
                path.display(),
                status
            ),
            Err(e) => warn!("Background removal of {} failed: {}", path.display(), e),
        }
    });
    Ok(pid)
}

#[cfg(not(unix))]
fn spawn_removal(path: &Path) -> io::Result<Option<u32>> {
    let path = path.to_path_buf();
    std::thread::Builder::new()
        .name("plzcache-clean".to_string())
        .spawn(move || {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!("Background removal of {} failed: {}", path.display(), e);
            }
        })
        .map(|_| None)
}

/// Sibling directories left by background removals still in progress
#[cfg(test)]
pub(crate) fn pending_removals(path: &Path) -> Vec<std::path::PathBuf> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return vec![];
    };
    let prefix = format!(".{}.deleting-", name.to_string_lossy());

    std::fs::read_dir(if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    })
    .map(|entries| {
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect()
    })
    .unwrap_or_default()
}

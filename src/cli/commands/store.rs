//! Store command - put a target's outputs in the cache

use super::decode_key;
use crate::build::{BuildLabel, BuildMetadata, BuildTarget};
use crate::cache::dir::check_relative;
use crate::cache::new_cache;
use crate::cli::args::StoreArgs;
use crate::config::Config;
use crate::error::{PlzError, PlzResult};
use console::style;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Execute the store command
pub async fn execute(args: StoreArgs, config: &Config, workspace: &Path) -> PlzResult<()> {
    let label = BuildLabel::parse(&args.label)?;

    // The queued store reports failures only in the log, so catch what the
    // backend would reject before queueing
    for file in &args.files {
        check_relative(file)?;
        if !workspace.join(file).exists() {
            return Err(PlzError::CacheOutputMissing {
                target: label.to_string(),
                path: file.clone(),
            });
        }
    }

    let key = match &args.key {
        Some(key) => decode_key(key)?,
        None => fingerprint(&label, workspace, &args.files).await?,
    };

    let cache = new_cache(&config.cache, workspace).ok_or(PlzError::CacheDisabled)?;
    let outputs = args
        .files
        .iter()
        .map(|f| f.to_string_lossy().into_owned())
        .collect();
    let target = Arc::new(BuildTarget::new(label.clone()));

    let result = cache
        .store(target, key.clone(), BuildMetadata::success(outputs), args.files)
        .await;
    // Waits for the queued store to land
    cache.shutdown().await;
    result?;

    println!(
        "{} Stored {} under key {}",
        style("✓").green(),
        label,
        style(hex::encode(&key)).dim()
    );
    Ok(())
}

/// Hash a label together with the contents of its output files
///
/// Files are hashed in path order so the key doesn't depend on argument
/// order.
async fn fingerprint(
    label: &BuildLabel,
    workspace: &Path,
    files: &[PathBuf],
) -> PlzResult<Vec<u8>> {
    let mut sorted: Vec<&PathBuf> = files.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(label.to_string().as_bytes());
    for file in sorted {
        let path = workspace.join(file);
        let content = fs::read(&path)
            .await
            .map_err(|e| PlzError::io(format!("reading {}", path.display()), e))?;
        hasher.update([0u8]);
        hasher.update(file.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(&content);
    }
    Ok(hasher.finalize().to_vec())
}

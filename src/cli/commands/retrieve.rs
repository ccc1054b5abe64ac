//! Retrieve command - restore a target's outputs from the cache

use super::decode_key;
use crate::build::{BuildLabel, BuildTarget};
use crate::cache::new_cache;
use crate::cli::args::RetrieveArgs;
use crate::config::Config;
use crate::error::{PlzError, PlzResult};
use console::style;
use std::path::Path;

/// Execute the retrieve command
pub async fn execute(args: RetrieveArgs, config: &Config, workspace: &Path) -> PlzResult<()> {
    let label = BuildLabel::parse(&args.label)?;
    let key = decode_key(&args.key)?;
    let cache = new_cache(&config.cache, workspace).ok_or(PlzError::CacheDisabled)?;

    let target = BuildTarget::new(label.clone());
    let result = cache.retrieve(&target, &key, &args.files).await;
    cache.shutdown().await;

    let Some(metadata) = result? else {
        return Err(PlzError::CacheMiss(label.to_string()));
    };

    println!(
        "{} Restored {} file(s) for {} (built {})",
        style("✓").green(),
        args.files.len(),
        label,
        metadata.start_time.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

//! Clean command - remove build outputs and cache entries

use crate::build::{BuildGraph, BuildLabel, BuildState, OutputLayout};
use crate::cache::{new_cache, Cache};
use crate::clean::{self, CleanOutcome, FsArtifacts};
use crate::cli::args::CleanArgs;
use crate::config::Config;
use crate::error::PlzResult;
use console::style;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Execute the clean command
pub async fn execute(args: CleanArgs, config: &Config, workspace: &Path) -> PlzResult<()> {
    let labels = args
        .labels
        .iter()
        .map(|l| BuildLabel::parse(l))
        .collect::<PlzResult<Vec<_>>>()?;

    let layout = OutputLayout::new(workspace.join(&config.build.out_dir));
    let remover = FsArtifacts::new(layout.clone());
    let cache = if args.no_cache {
        debug!("Leaving cache untouched (--no-cache)");
        None
    } else {
        new_cache(&config.cache, workspace)
    };

    let result = if labels.is_empty() {
        clean_everything(&layout, cache.as_deref(), &remover, &args, config).await
    } else {
        clean_labels(&labels, layout, cache.clone(), &remover, config, workspace).await
    };

    if let Some(cache) = &cache {
        cache.shutdown().await;
    }
    result
}

async fn clean_everything(
    layout: &OutputLayout,
    cache: Option<&dyn Cache>,
    remover: &FsArtifacts,
    args: &CleanArgs,
    config: &Config,
) -> PlzResult<()> {
    let outcome = clean::clean(
        layout.root(),
        cache,
        remover,
        args.background,
        config.cache.flush_before_clean,
    )
    .await?;

    match outcome {
        CleanOutcome::Backgrounded => println!(
            "Cleaning in background; you may continue to do things in this repo in the meantime."
        ),
        CleanOutcome::Removed => println!(
            "{} Cleaned {}",
            style("✓").green(),
            layout.root().display()
        ),
    }
    Ok(())
}

async fn clean_labels(
    labels: &[BuildLabel],
    layout: OutputLayout,
    cache: Option<Arc<dyn Cache>>,
    remover: &FsArtifacts,
    config: &Config,
    workspace: &Path,
) -> PlzResult<()> {
    let graph = BuildGraph::load(&workspace.join(&config.build.graph)).await?;
    let clean_cache = cache.is_some();

    let mut state = BuildState::new(graph, layout)
        .with_policy(config.build.include.clone(), config.build.exclude.clone());
    if let Some(cache) = cache {
        state = state.with_cache(cache);
    }

    let cleaned = clean::clean_targets(
        &state,
        remover,
        labels,
        clean_cache,
        config.cache.flush_before_clean,
    )
    .await?;

    println!(
        "{} Cleaned {} target(s)",
        style("✓").green(),
        cleaned
    );
    Ok(())
}

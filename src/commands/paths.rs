use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Get the repository root to use, resolving relative paths against the current directory
#[tracing::instrument(skip(runtime, root))]
pub fn repository_root<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(path) if path.is_relative() => runtime.current_dir()?.join(path),
        Some(path) => path,
        None => default_repository_root(runtime)?,
    };

    info!("Using plugin repository: {}", root.display());
    Ok(root)
}

/// Get the default plugin repository root: `<home>/.plugin-resolver/plugins`
#[tracing::instrument(skip(runtime))]
pub fn default_repository_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home_dir = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home_dir.join(".plugin-resolver").join("plugins"))
}

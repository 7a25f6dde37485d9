use anyhow::Result;
use log::{debug, warn};
use std::path::{Component, Path, PathBuf};

use crate::runtime::Runtime;
use crate::version::Version;

use super::{PluginEntry, RepositorySnapshot};

/// Scan a whole repository.
///
/// Directory structure: `<root>/<plugin_id>/<classifier>/<version>/`
#[tracing::instrument(skip(runtime, root))]
pub fn scan_repository<R: Runtime>(runtime: &R, root: &Path) -> Result<RepositorySnapshot> {
    let mut snapshot = RepositorySnapshot::empty(root);

    if !runtime.exists(root) {
        debug!("Plugin repository {:?} does not exist", root);
        return Ok(snapshot);
    }

    for plugin_path in sorted_subdirs(runtime, root)? {
        if let Some(plugin_id) = dir_name(&plugin_path) {
            scan_plugin_into(runtime, &plugin_path, plugin_id, &mut snapshot)?;
        }
    }

    debug!("Found {} artifact(s) in {:?}", snapshot.len(), root);
    Ok(snapshot)
}

/// Scan only `<root>/<plugin_id>`; the snapshot is empty if that directory is missing
/// or `plugin_id` is not a single directory name.
#[tracing::instrument(skip(runtime, root))]
pub fn scan_plugin<R: Runtime>(
    runtime: &R,
    root: &Path,
    plugin_id: &str,
) -> Result<RepositorySnapshot> {
    let mut snapshot = RepositorySnapshot::empty(root);
    if !is_plugin_id(plugin_id) {
        debug!("{:?} is not a plugin directory name", plugin_id);
        return Ok(snapshot);
    }

    let plugin_path = root.join(plugin_id);
    if runtime.is_dir(&plugin_path) {
        scan_plugin_into(runtime, &plugin_path, plugin_id, &mut snapshot)?;
    }
    Ok(snapshot)
}

fn scan_plugin_into<R: Runtime>(
    runtime: &R,
    plugin_path: &Path,
    plugin_id: &str,
    snapshot: &mut RepositorySnapshot,
) -> Result<()> {
    snapshot.add_plugin(plugin_id);

    for classifier_path in sorted_subdirs(runtime, plugin_path)? {
        let Some(classifier) = dir_name(&classifier_path) else {
            continue;
        };
        snapshot.add_classifier(plugin_id, classifier);

        for version_path in sorted_subdirs(runtime, &classifier_path)? {
            let Some(name) = dir_name(&version_path) else {
                continue;
            };
            match Version::parse(name) {
                Ok(version) => snapshot.insert(PluginEntry {
                    plugin_id: plugin_id.to_string(),
                    classifier: classifier.to_string(),
                    version,
                    dir_name: name.to_string(),
                    path: version_path.clone(),
                }),
                Err(e) => {
                    warn!("Skipping {:?}: {}", version_path, e);
                }
            }
        }
    }

    Ok(())
}

/// Subdirectories of `dir`, sorted by path so scans are deterministic.
fn sorted_subdirs<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = runtime
        .read_dir(dir)?
        .into_iter()
        .filter(|path| runtime.is_dir(path))
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// A plugin id must name exactly one directory directly below the root.
fn is_plugin_id(plugin_id: &str) -> bool {
    let mut components = Path::new(plugin_id).components();
    matches!(components.next(), Some(Component::Normal(name)) if name == plugin_id)
        && components.next().is_none()
}

fn dir_name(path: &Path) -> Option<&str> {
    let name = path.file_name().and_then(|n| n.to_str());
    if name.is_none() {
        warn!("Skipping non UTF-8 directory name {:?}", path);
    }
    name
}

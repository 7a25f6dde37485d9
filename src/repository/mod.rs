//! Plugin repository on disk.
//!
//! The repository is a directory tree populated by an external artifact
//! materializer: `<root>/<plugin_id>/<classifier>/<version>/...`. This module only
//! reads it. A scan produces an immutable [`RepositorySnapshot`] that resolutions
//! share; [`CachedRepository`] keeps one snapshot until told the tree changed.

mod cache;
mod discovery;
mod snapshot;

pub use cache::CachedRepository;
pub use discovery::{scan_plugin, scan_repository};
pub use snapshot::{PluginEntry, RepositorySnapshot};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::runtime::Runtime;
use crate::version::Version;

/// Read-only access to a plugin repository rooted at one directory.
pub struct PluginRepository<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> PluginRepository<'a, R> {
    pub fn new(runtime: &'a R, root: PathBuf) -> Self {
        Self { runtime, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns: `<root>/<plugin_id>`
    pub fn plugin_dir(&self, plugin_id: &str) -> PathBuf {
        self.root.join(plugin_id)
    }

    /// Scan the whole repository into an immutable snapshot.
    pub fn scan(&self) -> Result<RepositorySnapshot, ResolveError> {
        scan_repository(self.runtime, &self.root).map_err(|e| ResolveError::scan(&self.root, e))
    }

    /// Installed versions of one plugin, read directly from disk.
    ///
    /// For several lookups that must agree with each other, [`scan`](Self::scan)
    /// once and query the snapshot instead.
    pub fn list_versions(
        &self,
        plugin_id: &str,
        classifier: &str,
    ) -> Result<BTreeSet<Version>, ResolveError> {
        self.scan_one(plugin_id)?.list_versions(plugin_id, classifier)
    }

    /// Directory of one installed version, read directly from disk.
    pub fn locate(
        &self,
        plugin_id: &str,
        classifier: &str,
        version: &Version,
    ) -> Result<PathBuf, ResolveError> {
        self.scan_one(plugin_id)?
            .locate(plugin_id, classifier, version)
            .map(Path::to_path_buf)
    }

    fn scan_one(&self, plugin_id: &str) -> Result<RepositorySnapshot, ResolveError> {
        let plugin_dir = self.plugin_dir(plugin_id);
        scan_plugin(self.runtime, &self.root, plugin_id)
            .map_err(|e| ResolveError::scan(&plugin_dir, e))
    }
}

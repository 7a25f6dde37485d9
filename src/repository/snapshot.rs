use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::version::Version;

/// One installed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub plugin_id: String,
    pub classifier: String,
    pub version: Version,
    /// Version directory name as found on disk (may differ from the canonical form).
    pub dir_name: String,
    pub path: PathBuf,
}

type VersionIndex = BTreeMap<Version, PluginEntry>;

/// Immutable view of a plugin repository taken by a single scan.
///
/// Plugin id → classifier → version. A resolution works against one snapshot, so
/// listing and locating always agree with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    root: PathBuf,
    plugins: BTreeMap<String, BTreeMap<String, VersionIndex>>,
}

impl RepositorySnapshot {
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            plugins: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register a plugin id, even if it has no classifier or version directories.
    pub(crate) fn add_plugin(&mut self, plugin_id: &str) {
        self.plugins.entry(plugin_id.to_string()).or_default();
    }

    /// Register a classifier of a plugin, even if it has no version directories.
    pub(crate) fn add_classifier(&mut self, plugin_id: &str, classifier: &str) {
        self.plugins
            .entry(plugin_id.to_string())
            .or_default()
            .entry(classifier.to_string())
            .or_default();
    }

    /// Add an entry. An equal version already present is replaced.
    pub(crate) fn insert(&mut self, entry: PluginEntry) {
        let versions = self
            .plugins
            .entry(entry.plugin_id.clone())
            .or_default()
            .entry(entry.classifier.clone())
            .or_default();

        if let Some(previous) = versions.remove(&entry.version) {
            warn!(
                "{}:{} has both {:?} and {:?} for version {}; using {:?}",
                entry.plugin_id,
                entry.classifier,
                previous.dir_name,
                entry.dir_name,
                entry.version,
                entry.dir_name
            );
        }
        versions.insert(entry.version.clone(), entry);
    }

    pub fn contains_plugin(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    pub fn plugin_ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Classifiers installed for a plugin, sorted by name.
    pub fn classifiers(&self, plugin_id: &str) -> Result<Vec<&str>, ResolveError> {
        Ok(self
            .classifier_index(plugin_id)?
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// Installed versions of `plugin_id` under `classifier`.
    ///
    /// Fails with [`ResolveError::PluginNotFound`] only when the plugin id itself is
    /// unknown; a missing classifier yields an empty set.
    pub fn list_versions(
        &self,
        plugin_id: &str,
        classifier: &str,
    ) -> Result<BTreeSet<Version>, ResolveError> {
        Ok(self
            .entries(plugin_id, classifier)?
            .into_iter()
            .map(|entry| entry.version.clone())
            .collect())
    }

    /// Entries of `plugin_id` under `classifier`, ascending by version.
    pub fn entries(
        &self,
        plugin_id: &str,
        classifier: &str,
    ) -> Result<Vec<&PluginEntry>, ResolveError> {
        Ok(self
            .classifier_index(plugin_id)?
            .get(classifier)
            .map(|versions| versions.values().collect())
            .unwrap_or_default())
    }

    /// Directory of an installed version.
    pub fn locate(
        &self,
        plugin_id: &str,
        classifier: &str,
        version: &Version,
    ) -> Result<&Path, ResolveError> {
        self.classifier_index(plugin_id)?
            .get(classifier)
            .and_then(|versions| versions.get(version))
            .map(|entry| entry.path.as_path())
            .ok_or_else(|| ResolveError::VersionNotInstalled {
                plugin_id: plugin_id.to_string(),
                classifier: classifier.to_string(),
                version: version.clone(),
            })
    }

    /// Every entry in the snapshot, ordered by plugin id, classifier and version.
    pub fn iter(&self) -> impl Iterator<Item = &PluginEntry> {
        self.plugins
            .values()
            .flat_map(|classifiers| classifiers.values())
            .flat_map(|versions| versions.values())
    }

    /// Number of installed artifacts.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn classifier_index(
        &self,
        plugin_id: &str,
    ) -> Result<&BTreeMap<String, VersionIndex>, ResolveError> {
        self.plugins
            .get(plugin_id)
            .ok_or_else(|| ResolveError::PluginNotFound {
                plugin_id: plugin_id.to_string(),
            })
    }
}

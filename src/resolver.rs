//! Plugin resolution: turn (plugin id, classifier, constraint) into one installed artifact.
//!
//! The resolver works against a single [`RepositorySnapshot`], so the versions it
//! lists and the path it returns always come from the same scan.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::repository::RepositorySnapshot;
use crate::version::{Constraint, Version, VersionMatcher};

/// Classifier used when a request does not name one.
pub const DEFAULT_CLASSIFIER: &str = "plugin";

/// What to do when a constraint matches more than one installed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Pick the greatest matching version.
    #[default]
    LatestWins,
    /// Fail with [`ResolveError::AmbiguousMatch`], unless the constraint is `latest`.
    Strict,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::LatestWins => f.write_str("latest-wins"),
            SelectionPolicy::Strict => f.write_str("strict"),
        }
    }
}

/// A resolved plugin artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlugin {
    pub plugin_id: String,
    pub classifier: String,
    pub version: Version,
    pub path: PathBuf,
}

/// One plugin request, as read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRequest {
    pub id: String,
    pub version: VersionMatcher,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

/// Resolves plugin requests against one repository snapshot.
///
/// Cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    snapshot: Arc<RepositorySnapshot>,
    policy: SelectionPolicy,
    default_classifier: String,
}

impl Resolver {
    pub fn new(snapshot: Arc<RepositorySnapshot>) -> Self {
        Self {
            snapshot,
            policy: SelectionPolicy::default(),
            default_classifier: DEFAULT_CLASSIFIER.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.default_classifier = classifier.into();
        self
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn default_classifier(&self) -> &str {
        &self.default_classifier
    }

    pub fn snapshot(&self) -> &RepositorySnapshot {
        &self.snapshot
    }

    /// Resolve a raw constraint string.
    ///
    /// `classifier` of `None` means the default classifier.
    pub fn resolve(
        &self,
        plugin_id: &str,
        classifier: Option<&str>,
        constraint: &str,
    ) -> Result<ResolvedPlugin, ResolveError> {
        let matcher = VersionMatcher::parse(constraint)?;
        self.resolve_with(plugin_id, classifier, &matcher)
    }

    /// Resolve with a pre-built constraint, built-in or caller-defined.
    #[tracing::instrument(skip(self, constraint), fields(constraint = constraint.to_version_string()))]
    pub fn resolve_with<C: Constraint + ?Sized>(
        &self,
        plugin_id: &str,
        classifier: Option<&str>,
        constraint: &C,
    ) -> Result<ResolvedPlugin, ResolveError> {
        let classifier = classifier.unwrap_or(&self.default_classifier);

        let installed = self.snapshot.list_versions(plugin_id, classifier)?;
        let mut candidates: Vec<Version> = installed
            .into_iter()
            .filter(|version| constraint.matches(version))
            .collect();
        debug!(
            "{}:{} has {} candidate(s) for {}",
            plugin_id,
            classifier,
            candidates.len(),
            constraint.description()
        );

        let chosen = match candidates.len() {
            0 => {
                return Err(ResolveError::NoMatchingVersion {
                    plugin_id: plugin_id.to_string(),
                    classifier: classifier.to_string(),
                    constraint: constraint.description(),
                });
            }
            1 => candidates.remove(0),
            _ if self.policy == SelectionPolicy::Strict && !constraint.selects_latest() => {
                return Err(ResolveError::AmbiguousMatch {
                    plugin_id: plugin_id.to_string(),
                    classifier: classifier.to_string(),
                    constraint: constraint.description(),
                    candidates,
                });
            }
            // Candidates come from a sorted set, so the last one is the greatest
            _ => candidates.remove(candidates.len() - 1),
        };

        let path = self
            .snapshot
            .locate(plugin_id, classifier, &chosen)?
            .to_path_buf();
        info!("Resolved {}:{} {} -> {:?}", plugin_id, classifier, chosen, path);

        Ok(ResolvedPlugin {
            plugin_id: plugin_id.to_string(),
            classifier: classifier.to_string(),
            version: chosen,
            path,
        })
    }

    /// Resolve every request, keeping the request order.
    pub fn resolve_all(
        &self,
        requests: &[PluginRequest],
    ) -> Vec<Result<ResolvedPlugin, ResolveError>> {
        requests
            .iter()
            .map(|request| {
                self.resolve_with(&request.id, request.classifier.as_deref(), &request.version)
            })
            .collect()
    }
}

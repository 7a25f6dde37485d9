use anyhow::{Result, bail};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    error::ResolveError,
    manifest::Manifest,
    repository::{PluginRepository, RepositorySnapshot},
    resolver::{PluginRequest, ResolvedPlugin, Resolver, SelectionPolicy},
    runtime::Runtime,
    version::Constraint,
};

pub mod config;
mod paths;

pub use paths::{default_repository_root, repository_root};

use config::Config;

fn scan<R: Runtime>(config: &Config<R>) -> Result<Arc<RepositorySnapshot>> {
    let repository = PluginRepository::new(&config.runtime, config.root.clone());
    Ok(Arc::new(repository.scan()?))
}

/// List installed plugins, optionally only one plugin id and/or one classifier
#[tracing::instrument(skip(runtime, root))]
pub fn list<R: Runtime>(
    runtime: R,
    root: Option<PathBuf>,
    classifier: Option<String>,
    plugin_id: Option<&str>,
) -> Result<()> {
    let config = Config::new(runtime, root, classifier.clone())?;
    debug!("Listing plugins from {:?}", config.root);

    let snapshot = scan(&config)?;
    for line in list_lines(&snapshot, plugin_id, classifier.as_deref())? {
        println!("{}", line);
    }

    Ok(())
}

/// Rows printed by `list`: `<plugin_id> <classifier> <version>`, or a single
/// message when nothing is installed for the filter.
fn list_lines(
    snapshot: &RepositorySnapshot,
    plugin_id: Option<&str>,
    classifier: Option<&str>,
) -> Result<Vec<String>, ResolveError> {
    if let Some(plugin_id) = plugin_id {
        // Fails with PluginNotFound for an unknown id
        snapshot.classifiers(plugin_id)?;
    }

    let lines: Vec<String> = snapshot
        .iter()
        .filter(|entry| plugin_id.is_none_or(|id| entry.plugin_id == id))
        .filter(|entry| classifier.is_none_or(|c| entry.classifier == c))
        .map(|entry| format!("{} {} {}", entry.plugin_id, entry.classifier, entry.version))
        .collect();
    debug!("Found {} artifact(s)", lines.len());

    if !lines.is_empty() {
        return Ok(lines);
    }
    let message = match (plugin_id, classifier) {
        (Some(id), Some(classifier)) => format!("No versions installed for {}:{}", id, classifier),
        (Some(id), None) => format!("No versions installed for {}", id),
        (None, Some(classifier)) => format!("No plugins installed with classifier {}", classifier),
        (None, None) => "No plugins installed.".to_string(),
    };
    Ok(vec![message])
}

/// Resolve one plugin and print the directory of the chosen version
#[tracing::instrument(skip(runtime, root, classifier))]
pub fn resolve<R: Runtime>(
    runtime: R,
    root: Option<PathBuf>,
    classifier: Option<String>,
    plugin_id: &str,
    constraint: &str,
    strict: bool,
) -> Result<()> {
    let config = Config::new(runtime, root, classifier)?;
    let resolver = Resolver::new(scan(&config)?)
        .with_default_classifier(config.classifier.as_str())
        .with_policy(policy_for(strict));

    let resolved = resolver.resolve(plugin_id, None, constraint)?;
    println!("{}", resolved.path.display());
    Ok(())
}

/// Resolve every plugin listed in a manifest
///
/// Prints one line per request and fails if any request could not be resolved.
#[tracing::instrument(skip(runtime, root, classifier))]
pub fn check<R: Runtime>(
    runtime: R,
    root: Option<PathBuf>,
    classifier: Option<String>,
    manifest_path: &Path,
    strict: bool,
) -> Result<()> {
    let config = Config::new(runtime, root, classifier.clone())?;
    let manifest = Manifest::load(&config.runtime, manifest_path)?;

    // An explicit --classifier wins over the manifest's default
    let default_classifier = classifier
        .or(manifest.default_classifier.clone())
        .unwrap_or(config.classifier.clone());
    let policy = if strict {
        SelectionPolicy::Strict
    } else {
        manifest.policy.unwrap_or_default()
    };
    debug!(
        "Checking {} plugin(s) with policy {} and classifier {}",
        manifest.plugins.len(),
        policy,
        default_classifier
    );

    let resolver = Resolver::new(scan(&config)?)
        .with_default_classifier(default_classifier)
        .with_policy(policy);

    let mut failures = 0;
    for (request, result) in manifest
        .plugins
        .iter()
        .zip(resolver.resolve_all(&manifest.plugins))
    {
        if let Err(e) = &result {
            failures += 1;
            warn!("Failed to resolve {}: {}", request.id, e);
        }
        println!("{}", check_line(request, &result));
    }

    if failures > 0 {
        bail!(
            "{} of {} plugin(s) could not be resolved",
            failures,
            manifest.plugins.len()
        );
    }
    Ok(())
}

/// One `check` row: `<id>:<classifier> <constraint> -> <version> <path>` or
/// `<id> <constraint> -> error: <message>`.
fn check_line(request: &PluginRequest, result: &Result<ResolvedPlugin, ResolveError>) -> String {
    let constraint = request.version.to_version_string();
    match result {
        Ok(resolved) => format!(
            "{}:{} {} -> {} {}",
            resolved.plugin_id,
            resolved.classifier,
            constraint,
            resolved.version,
            resolved.path.display()
        ),
        Err(e) => format!("{} {} -> error: {}", request.id, constraint, e),
    }
}

fn policy_for(strict: bool) -> SelectionPolicy {
    if strict {
        SelectionPolicy::Strict
    } else {
        SelectionPolicy::LatestWins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::PluginEntry;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::version::{Version, VersionMatcher};
    use crate::test_utils::{configure_mock_runtime_basics, test_root};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    fn install(root: &Path, plugin_id: &str, classifier: &str, version: &str) {
        fs::create_dir_all(root.join(plugin_id).join(classifier).join(version)).unwrap();
    }

    #[test]
    fn test_list_no_plugins() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);
        runtime
            .expect_exists()
            .with(eq(test_root()))
            .returning(|_| false);

        assert!(list(runtime, None, None, None).is_ok());
    }

    #[test]
    fn test_list_with_plugins() {
        let dir = tempdir().unwrap();
        install(dir.path(), "foo", "plugin", "1.0.0");
        install(dir.path(), "bar", "plugin", "2.0.0");

        assert!(list(RealRuntime, Some(dir.path().to_path_buf()), None, None).is_ok());
        assert!(list(RealRuntime, Some(dir.path().to_path_buf()), None, Some("foo")).is_ok());
    }

    #[test]
    fn test_list_unknown_plugin() {
        let dir = tempdir().unwrap();
        install(dir.path(), "foo", "plugin", "1.0.0");

        let err = list(RealRuntime, Some(dir.path().to_path_buf()), None, Some("bar")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResolveError>(),
            Some(&ResolveError::PluginNotFound {
                plugin_id: "bar".into()
            })
        );
    }

    #[test]
    fn test_resolve_command() {
        let dir = tempdir().unwrap();
        for version in ["1.0.0", "1.2.0", "2.0.0"] {
            install(dir.path(), "foo", "plugin", version);
        }
        let root = Some(dir.path().to_path_buf());

        assert!(resolve(RealRuntime, root.clone(), None, "foo", "1.2.0", false).is_ok());
        assert!(resolve(RealRuntime, root.clone(), None, "foo", "[1,3)", false).is_ok());

        let err = resolve(RealRuntime, root.clone(), None, "foo", "[1,3)", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::AmbiguousMatch { .. })
        ));

        let err = resolve(RealRuntime, root, Some("native".into()), "foo", "1.2.0", false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::NoMatchingVersion { .. })
        ));
    }

    #[test]
    fn test_check_manifest() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("plugins");
        install(&repo, "foo", "plugin", "1.2.0");
        install(&repo, "bar", "native", "0.9.0");
        install(&repo, "bar", "native", "1.0.0");

        let manifest = dir.path().join("plugins.json");
        fs::write(
            &manifest,
            r#"{
                "policy": "strict",
                "plugins": [
                    { "id": "foo", "version": "1.2" },
                    { "id": "bar", "version": "latest", "classifier": "native" }
                ]
            }"#,
        )
        .unwrap();

        assert!(check(RealRuntime, Some(repo), None, &manifest, false).is_ok());
    }

    #[test_log::test]
    fn test_check_manifest_reports_failures() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("plugins");
        install(&repo, "foo", "plugin", "1.2.0");

        let manifest = dir.path().join("plugins.json");
        fs::write(
            &manifest,
            r#"{ "plugins": [
                { "id": "foo", "version": "1.2.0" },
                { "id": "foo", "version": "9.9.9" },
                { "id": "missing", "version": "*" }
            ] }"#,
        )
        .unwrap();

        let err = check(RealRuntime, Some(repo), None, &manifest, false).unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 plugin(s) could not be resolved");
    }

    #[test]
    fn test_check_manifest_default_classifier() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("plugins");
        install(&repo, "foo", "native", "1.0.0");

        let manifest = dir.path().join("plugins.json");
        fs::write(
            &manifest,
            r#"{ "default_classifier": "native", "plugins": [ { "id": "foo", "version": "1.0.0" } ] }"#,
        )
        .unwrap();

        assert!(check(RealRuntime, Some(repo.clone()), None, &manifest, false).is_ok());
        // --classifier overrides the manifest
        assert!(check(RealRuntime, Some(repo), Some("plugin".into()), &manifest, false).is_err());
    }

    fn sample_snapshot() -> RepositorySnapshot {
        let mut snapshot = RepositorySnapshot::empty("/plugins");
        for (plugin_id, classifier, version) in [
            ("foo", "plugin", "1.0.0"),
            ("foo", "native", "1.0.0"),
            ("bar", "plugin", "2.0"),
        ] {
            snapshot.insert(PluginEntry {
                plugin_id: plugin_id.to_string(),
                classifier: classifier.to_string(),
                version: Version::parse(version).unwrap(),
                dir_name: version.to_string(),
                path: Path::new("/plugins")
                    .join(plugin_id)
                    .join(classifier)
                    .join(version),
            });
        }
        snapshot.add_plugin("empty");
        snapshot
    }

    #[test]
    fn test_list_lines_filters() {
        let snapshot = sample_snapshot();

        assert_eq!(
            list_lines(&snapshot, None, None).unwrap(),
            vec!["bar plugin 2.0", "foo native 1.0.0", "foo plugin 1.0.0"]
        );
        assert_eq!(
            list_lines(&snapshot, None, Some("native")).unwrap(),
            vec!["foo native 1.0.0"]
        );
        assert_eq!(
            list_lines(&snapshot, Some("foo"), Some("plugin")).unwrap(),
            vec!["foo plugin 1.0.0"]
        );
    }

    #[test]
    fn test_list_lines_nothing_installed() {
        let snapshot = sample_snapshot();

        assert_eq!(
            list_lines(&snapshot, Some("empty"), None).unwrap(),
            vec!["No versions installed for empty"]
        );
        assert_eq!(
            list_lines(&snapshot, Some("bar"), Some("native")).unwrap(),
            vec!["No versions installed for bar:native"]
        );
        assert_eq!(
            list_lines(&snapshot, None, Some("javadoc")).unwrap(),
            vec!["No plugins installed with classifier javadoc"]
        );
        assert_eq!(
            list_lines(&RepositorySnapshot::empty("/plugins"), None, None).unwrap(),
            vec!["No plugins installed."]
        );
    }

    #[test]
    fn test_check_line() {
        let request = PluginRequest {
            id: "foo".into(),
            version: VersionMatcher::parse(" [1.0,2.0) ").unwrap(),
            classifier: None,
        };

        let resolved = Ok(ResolvedPlugin {
            plugin_id: "foo".into(),
            classifier: "plugin".into(),
            version: Version::parse("1.2.0").unwrap(),
            path: PathBuf::from("/plugins/foo/plugin/1.2.0"),
        });
        assert_eq!(
            check_line(&request, &resolved),
            "foo:plugin [1.0,2.0) -> 1.2.0 /plugins/foo/plugin/1.2.0"
        );

        let failed = Err(ResolveError::PluginNotFound {
            plugin_id: "foo".into(),
        });
        assert_eq!(
            check_line(&request, &failed),
            "foo [1.0,2.0) -> error: Plugin not found: foo"
        );
    }
}

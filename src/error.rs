//! Error types for version parsing, repository scans and plugin resolution.

use std::path::PathBuf;
use thiserror::Error;

use crate::version::Version;

/// Errors produced by the version model, the plugin repository and the resolver.
///
/// Every failure is reported as a value; no operation falls back to another
/// version on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Invalid version format '{raw}': {reason}")]
    InvalidVersionFormat { raw: String, reason: String },

    #[error("Plugin not found: {plugin_id}")]
    PluginNotFound { plugin_id: String },

    #[error("Version {version} of {plugin_id}:{classifier} is not installed")]
    VersionNotInstalled {
        plugin_id: String,
        classifier: String,
        version: Version,
    },

    #[error("No installed version of {plugin_id}:{classifier} satisfies '{constraint}'")]
    NoMatchingVersion {
        plugin_id: String,
        classifier: String,
        constraint: String,
    },

    #[error(
        "Constraint '{constraint}' matches {} versions of {plugin_id}:{classifier} ({})",
        .candidates.len(),
        join_versions(.candidates)
    )]
    AmbiguousMatch {
        plugin_id: String,
        classifier: String,
        constraint: String,
        candidates: Vec<Version>,
    },

    #[error("Failed to scan plugin repository at {path:?}: {message}")]
    RepositoryScan { path: PathBuf, message: String },
}

impl ResolveError {
    pub(crate) fn invalid_format(raw: &str, reason: impl Into<String>) -> Self {
        ResolveError::InvalidVersionFormat {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn scan(path: &std::path::Path, err: anyhow::Error) -> Self {
        ResolveError::RepositoryScan {
            path: path.to_path_buf(),
            message: format!("{:#}", err),
        }
    }
}

fn join_versions(versions: &[Version]) -> String {
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_message_includes_raw_text() {
        let err = ResolveError::invalid_format("not-a-version", "segment 'not' is not numeric");
        assert_eq!(
            err.to_string(),
            "Invalid version format 'not-a-version': segment 'not' is not numeric"
        );
    }

    #[test]
    fn test_ambiguous_match_lists_candidates() {
        let err = ResolveError::AmbiguousMatch {
            plugin_id: "foo".into(),
            classifier: "plugin".into(),
            constraint: "Any version".into(),
            candidates: vec![
                Version::parse("1.0.0").unwrap(),
                Version::parse("2.0.0").unwrap(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Constraint 'Any version' matches 2 versions of foo:plugin (1.0.0, 2.0.0)"
        );
    }

    #[test]
    fn test_scan_error_keeps_context_chain() {
        let source = anyhow::anyhow!("permission denied").context("Failed to read directory");
        let err = ResolveError::scan(std::path::Path::new("/plugins"), source);
        assert!(err.to_string().contains("Failed to read directory: permission denied"));
    }
}

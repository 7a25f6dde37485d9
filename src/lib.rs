//! Plugin version resolution.
//!
//! A host application asks for a plugin by id, classifier and version constraint;
//! this crate finds the matching artifact in a plugin repository laid out on disk
//! as `<root>/<plugin_id>/<classifier>/<version>/`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use plugin_resolver::{repository::PluginRepository, resolver::Resolver, runtime::RealRuntime};
//!
//! # fn main() -> anyhow::Result<()> {
//! let runtime = RealRuntime;
//! let repository = PluginRepository::new(&runtime, "target/plugins".into());
//! let resolver = Resolver::new(Arc::new(repository.scan()?));
//! let resolved = resolver.resolve("foo", None, "[1.0,2.0)")?;
//! println!("{}", resolved.path.display());
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod error;
pub mod manifest;
pub mod repository;
pub mod resolver;
pub mod runtime;
pub mod version;

pub use error::ResolveError;
pub use resolver::{ResolvedPlugin, Resolver, SelectionPolicy};
pub use version::{Constraint, Version, VersionMatcher};

/// Test utilities for cross-platform path handling.
#[cfg(test)]
pub mod test_utils {
    use crate::runtime::MockRuntime;
    use std::path::PathBuf;

    /// Returns a test home directory path based on the platform.
    /// - Unix: `/home/user`
    /// - Windows: `C:\Users\user`
    pub fn test_home() -> PathBuf {
        #[cfg(not(windows))]
        {
            PathBuf::from("/home/user")
        }
        #[cfg(windows)]
        {
            PathBuf::from(r"C:\Users\user")
        }
    }

    /// Returns the default repository root under [`test_home`].
    pub fn test_root() -> PathBuf {
        test_home().join(".plugin-resolver").join("plugins")
    }

    /// Configure a mock runtime with common defaults for tests.
    /// - home dir set to [`test_home`]
    /// - current_dir set to [`test_home`]
    pub fn configure_mock_runtime_basics(runtime: &mut MockRuntime) {
        runtime.expect_home_dir().returning(|| Some(test_home()));
        runtime.expect_current_dir().returning(|| Ok(test_home()));
    }
}

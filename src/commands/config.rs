use anyhow::Result;
use std::path::PathBuf;

use crate::{resolver::DEFAULT_CLASSIFIER, runtime::Runtime};

use super::paths::repository_root;

/// Settings shared by every command, resolved from CLI flags and the environment.
pub struct Config<R: Runtime> {
    pub runtime: R,
    pub root: PathBuf,
    pub classifier: String,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, root: Option<PathBuf>, classifier: Option<String>) -> Result<Self> {
        let root = repository_root(&runtime, root)?;
        let classifier = classifier.unwrap_or_else(|| DEFAULT_CLASSIFIER.to_string());

        Ok(Self {
            runtime,
            root,
            classifier,
        })
    }
}

//! Plugin manifest: the list of plugins a host application requests.
//!
//! ```json
//! {
//!   "default_classifier": "plugin",
//!   "policy": "latest-wins",
//!   "plugins": [
//!     { "id": "foo", "version": "1.2.0" },
//!     { "id": "bar", "version": "[1.0,2.0)", "classifier": "native" }
//!   ]
//! }
//! ```
//!
//! Constraints are parsed while the manifest is loaded, so a malformed version
//! string fails at load time rather than at resolution time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::resolver::{PluginRequest, SelectionPolicy};
use crate::runtime::Runtime;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<SelectionPolicy>,
    #[serde(default)]
    pub plugins: Vec<PluginRequest>,
}

impl Manifest {
    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {:?}", path))?;
        Ok(manifest)
    }
}

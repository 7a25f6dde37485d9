use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::ResolveError;
use crate::runtime::Runtime;

use super::{PluginRepository, RepositorySnapshot};

/// Process-wide snapshot cache for one repository root.
///
/// The first call to [`snapshot`](Self::snapshot) scans the repository; later calls
/// hand out the same `Arc` until [`invalidate`](Self::invalidate) is called, e.g.
/// after the artifact materializer reports new installs.
pub struct CachedRepository<R: Runtime> {
    runtime: R,
    root: PathBuf,
    cached: RwLock<Option<Arc<RepositorySnapshot>>>,
}

impl<R: Runtime> CachedRepository<R> {
    pub fn new(runtime: R, root: PathBuf) -> Self {
        Self {
            runtime,
            root,
            cached: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current snapshot, scanning the repository if none is cached.
    pub fn snapshot(&self) -> Result<Arc<RepositorySnapshot>, ResolveError> {
        if let Some(snapshot) = self
            .cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(snapshot));
        }

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have scanned while we waited for the write lock
        if let Some(snapshot) = cached.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        debug!("Scanning plugin repository {:?}", self.root);
        let snapshot = Arc::new(PluginRepository::new(&self.runtime, self.root.clone()).scan()?);
        *cached = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next [`snapshot`](Self::snapshot) rescans.
    ///
    /// Snapshots already handed out stay valid and unchanged.
    pub fn invalidate(&self) {
        debug!("Invalidating cached snapshot of {:?}", self.root);
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

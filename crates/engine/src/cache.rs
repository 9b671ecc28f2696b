//! Build-versioned cache for expensive derived artifacts.
//!
//! Each derived artifact (similarity matrix, latent model) is keyed by the
//! content version of the table it was computed from. The coordination
//! rules:
//!
//! - a lookup with a matching version returns the cached artifact;
//! - a miss triggers one build; concurrent callers for the same version
//!   await that build instead of duplicating it;
//! - a build either fully succeeds and atomically replaces the slot, or
//!   fails and leaves the previous artifact (if any) intact — a partial
//!   artifact is never observable.
//!
//! Builds run on the blocking thread pool since they are CPU-bound.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// One cache slot guarded by the single-in-flight-build rule.
pub struct VersionedCache<T> {
    slot: RwLock<Option<(u64, Arc<T>)>>,
    build_lock: Mutex<()>,
}

impl<T: Send + Sync + 'static> VersionedCache<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Return the artifact for `version`, building it at most once.
    pub async fn get_or_build<F>(&self, version: u64, build: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        if let Some(hit) = self.lookup(version).await {
            return Ok(hit);
        }

        let _guard = self.build_lock.lock().await;

        // A concurrent caller may have finished the build while we waited
        if let Some(hit) = self.lookup(version).await {
            debug!("Cache filled while awaiting build lock (version {})", version);
            return Ok(hit);
        }

        debug!("Building artifact for version {}", version);
        let built = tokio::task::spawn_blocking(build).await??;
        let artifact = Arc::new(built);
        *self.slot.write().await = Some((version, artifact.clone()));
        Ok(artifact)
    }

    async fn lookup(&self, version: u64) -> Option<Arc<T>> {
        match &*self.slot.read().await {
            Some((cached, artifact)) if *cached == version => Some(artifact.clone()),
            _ => None,
        }
    }
}

impl<T: Send + Sync + 'static> Default for VersionedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_builds_once_for_concurrent_callers() {
        let cache = Arc::new(VersionedCache::<u32>::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let make_build = |builds: Arc<AtomicUsize>| {
            move || -> Result<u32> {
                builds.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(50));
                Ok(7)
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_build(1, make_build(builds.clone())),
            cache.get_or_build(1, make_build(builds.clone())),
        );

        assert_eq!(*a.unwrap(), 7);
        assert_eq!(*b.unwrap(), 7);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_version_mismatch_rebuilds() {
        let cache = VersionedCache::<u32>::new();

        let first = cache.get_or_build(1, || Ok(1u32)).await.unwrap();
        let second = cache.get_or_build(2, || Ok(2u32)).await.unwrap();

        assert_eq!(*first, 1);
        assert_eq!(*second, 2);
    }

    #[tokio::test]
    async fn test_failed_build_keeps_previous_artifact() {
        let cache = VersionedCache::<u32>::new();

        cache.get_or_build(1, || Ok(1u32)).await.unwrap();

        // A failing build for a new version must not clobber the old slot
        let err = cache
            .get_or_build(2, || Err::<u32, _>(anyhow!("boom")))
            .await;
        assert!(err.is_err());

        let kept = cache.get_or_build(1, || Ok(99u32)).await.unwrap();
        assert_eq!(*kept, 1, "previous artifact should still be served");
    }
}

//! Precomputed feature index, keyed by catalog fingerprint.
//!
//! ## Locking
//! - `current` (RwLock) holds the last built index; readers only take the read
//!   lock long enough to clone an `Arc`.
//! - `rebuild_lock` (Mutex) serializes rebuilds. The expensive vectorization
//!   runs while holding only this lock, so readers of the previous index are
//!   never blocked by a rebuild; the write lock is taken just to swap in the
//!   finished index.

use crate::engine::FeatureIndex;
use data_loader::{Catalog, CatalogFingerprint};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Caches the [`FeatureIndex`] of the most recent catalog snapshot.
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Debug, Default)]
pub struct IndexCache {
    current: RwLock<Option<Arc<FeatureIndex>>>,
    rebuild_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index for `catalog`, building it if the cached one is for a
    /// different snapshot.
    ///
    /// At most one build runs at a time. A caller that waited for another
    /// thread's build reuses its result when the fingerprints agree.
    pub fn get_or_build(&self, catalog: &Catalog) -> Arc<FeatureIndex> {
        self.get_or_build_if_current(catalog, || true)
    }

    /// [`get_or_build`](Self::get_or_build) for callers whose snapshot may
    /// have been superseded.
    ///
    /// A freshly built index is only installed if `is_current()` still holds
    /// once the build finishes; otherwise it is returned to this caller alone
    /// and the cached index of the newer snapshot stays in place.
    pub fn get_or_build_if_current(
        &self,
        catalog: &Catalog,
        is_current: impl Fn() -> bool,
    ) -> Arc<FeatureIndex> {
        let fingerprint = catalog.fingerprint();
        if let Some(index) = self.lookup(fingerprint) {
            return index;
        }

        let _rebuild = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Someone else may have built it while we waited
        if let Some(index) = self.lookup(fingerprint) {
            debug!("Feature index for {} built by another caller", fingerprint);
            return index;
        }

        let start = Instant::now();
        let index = Arc::new(FeatureIndex::build(catalog));
        info!(
            "Built feature index for catalog {} ({} items, {} tokens) in {:.2?}",
            fingerprint,
            index.matrix().len(),
            index.matrix().vocabulary().len(),
            start.elapsed()
        );

        self.builds.fetch_add(1, Ordering::Relaxed);
        if !is_current() {
            debug!("Catalog {} superseded, not caching its index", fingerprint);
            return index;
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(index.clone());
        index
    }

    /// The cached index, whatever snapshot it belongs to
    pub fn current(&self) -> Option<Arc<FeatureIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the cached index; the next query rebuilds
    pub fn invalidate(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of builds performed so far
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    fn lookup(&self, fingerprint: CatalogFingerprint) -> Option<Arc<FeatureIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|index| index.fingerprint() == fingerprint)
            .cloned()
    }
}

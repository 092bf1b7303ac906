//! A swappable catalog reference for long-lived processes.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::ResourceCatalog;

/// Holds the current catalog snapshot.
///
/// Readers take an `Arc` and keep querying it even if a reload happens
/// meanwhile. A reload builds the new catalog completely before swapping the
/// reference, so nobody sees a partially loaded set.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    current: RwLock<Arc<ResourceCatalog>>,
}

impl SharedCatalog {
    /// Wrap an initial catalog.
    #[must_use]
    pub fn new(catalog: ResourceCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ResourceCatalog> {
        // A poisoned lock still guards a complete Arc; the swap is a single store.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the snapshot, returning the previous one.
    pub fn replace(&self, catalog: ResourceCatalog) -> Arc<ResourceCatalog> {
        let fresh = Arc::new(catalog);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, fresh)
    }

    /// Load `path` into a new catalog and swap it in.
    pub fn reload(&self, path: impl AsRef<Path>) -> Arc<ResourceCatalog> {
        let catalog = ResourceCatalog::load(path);
        info!("Swapping in catalog with {} resources", catalog.len());
        self.replace(catalog);
        self.snapshot()
    }
}

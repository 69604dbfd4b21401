use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::TypeCatalog;
use crate::error::{Result, SchemaBindError};
use crate::traits::CatalogStore;

/// A catalog store that keeps the serialized document in memory.
///
/// Counts loads and saves so tests can verify when the cache is touched.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use schemabind::stores::InMemoryCatalogStore;
///
/// let store = Arc::new(InMemoryCatalogStore::new());
/// assert_eq!(store.save_count(), 0);
/// ```
#[derive(Default)]
pub struct InMemoryCatalogStore {
    document: Mutex<Option<String>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted catalog.
    pub fn with_catalog(catalog: &TypeCatalog) -> Self {
        let store = Self::new();
        *store.lock() = serde_json::to_string(catalog).ok();
        store
    }

    /// Start from a raw document, e.g. a corrupt one.
    pub fn with_document(document: impl Into<String>) -> Self {
        let store = Self::new();
        *store.lock() = Some(document.into());
        store
    }

    /// The currently persisted document, if any.
    pub fn document(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn load(&self) -> Result<Option<TypeCatalog>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let document = self.lock().clone();
        match document {
            None => Ok(None),
            Some(doc) => serde_json::from_str::<TypeCatalog>(&doc)
                .map(|c| Some(c.normalized()))
                .map_err(|e| SchemaBindError::CatalogStore(e.to_string())),
        }
    }

    async fn save(&self, catalog: &TypeCatalog) -> Result<()> {
        let doc = serde_json::to_string(catalog)
            .map_err(|e| SchemaBindError::CatalogStore(e.to_string()))?;
        *self.lock() = Some(doc);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

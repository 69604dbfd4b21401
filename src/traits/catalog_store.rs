use async_trait::async_trait;

use crate::catalog::TypeCatalog;
use crate::error::Result;

/// Persistent home of the type catalog.
///
/// Stores hold one whole document: `load` reads everything that was last
/// saved and `save` replaces it wholesale. A reader must never observe a
/// partially written catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the last saved catalog, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<TypeCatalog>>;

    async fn save(&self, catalog: &TypeCatalog) -> Result<()>;
}

//! Column type resolution over a self-healing catalog cache.
//!
//! A resolution walks a small state machine:
//!
//! ```text
//! Probe ──hit──────────────────────────> Resolved
//!   │
//!   └─miss─> RebuildPending ─> Probe ──hit─> Resolved
//!                                │
//!                                └─miss─> Failed
//! ```
//!
//! The catalog is rebuilt at most once per call. A single rebuild has to
//! satisfy every requested column because they share one schema snapshot.
//! A column the catalog already knows to have no bind type fails at once,
//! without a rebuild.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::catalog::{is_metadata_table, TypeCatalog, METADATA_COLUMN};
use crate::error::{Result, SchemaBindError};
use crate::introspector::SchemaIntrospector;
use crate::traits::CatalogStore;
use crate::types::BindType;

/// Bind types for columns of the metadata table, without any catalog.
pub(crate) fn metadata_bind_types<S: AsRef<str>>(columns: &[S]) -> Result<Vec<BindType>> {
    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            if column.eq_ignore_ascii_case(METADATA_COLUMN) {
                Ok(BindType::String)
            } else {
                Err(SchemaBindError::unresolved(
                    crate::catalog::METADATA_TABLE,
                    column,
                ))
            }
        })
        .collect()
}

enum ResolveState {
    Probe {
        catalog: Arc<TypeCatalog>,
        rebuilt: bool,
    },
    RebuildPending,
    Resolved(Vec<BindType>),
    Failed(String),
}

/// Resolves column names to bind types through the cached catalog.
pub struct TypeResolver {
    store: Arc<dyn CatalogStore>,
    introspector: SchemaIntrospector,
    catalog: RwLock<Option<Arc<TypeCatalog>>>,
    rebuilds: AtomicUsize,
}

impl TypeResolver {
    pub fn new(store: Arc<dyn CatalogStore>, introspector: SchemaIntrospector) -> Self {
        Self {
            store,
            introspector,
            catalog: RwLock::new(None),
            rebuilds: AtomicUsize::new(0),
        }
    }

    /// Number of catalog rebuilds performed by this resolver.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    /// Returns the bind type of each column of `table`, in request order.
    ///
    /// Fails with [`SchemaBindError::UnresolvedColumn`] if a column still
    /// has no type after at most one catalog rebuild.
    pub async fn resolve<S: AsRef<str>>(&self, table: &str, columns: &[S]) -> Result<Vec<BindType>> {
        if is_metadata_table(table) {
            return metadata_bind_types(columns);
        }
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = ResolveState::Probe {
            catalog: self.snapshot().await?,
            rebuilt: false,
        };

        loop {
            state = match state {
                ResolveState::Probe { catalog, rebuilt } => {
                    match catalog.lookup_all(table, columns) {
                        Ok(types) => match types.iter().position(|t| !t.is_known()) {
                            Some(i) => {
                                debug!(table, column = columns[i].as_ref(), "column has no bind type");
                                ResolveState::Failed(columns[i].as_ref().to_string())
                            }
                            None => ResolveState::Resolved(types),
                        },
                        Err(missing) if !rebuilt => {
                            debug!(table, column = missing, "catalog miss");
                            ResolveState::RebuildPending
                        }
                        Err(missing) => ResolveState::Failed(missing.to_string()),
                    }
                }
                ResolveState::RebuildPending => ResolveState::Probe {
                    catalog: self.rebuild().await?,
                    rebuilt: true,
                },
                ResolveState::Resolved(types) => return Ok(types),
                ResolveState::Failed(column) => {
                    warn!(table, column = %column, "column unresolved");
                    return Err(SchemaBindError::unresolved(table, &column));
                }
            };
        }
    }

    /// Rebuild the catalog from the live schema and install it.
    ///
    /// Concurrent rebuilds may run side by side; each installs a complete
    /// snapshot, never a merge.
    pub async fn rebuild(&self) -> Result<Arc<TypeCatalog>> {
        let catalog = Arc::new(self.introspector.rebuild().await?);
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        *self.catalog.write().await = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// The in-memory catalog, loading it from the store on first use.
    async fn snapshot(&self) -> Result<Arc<TypeCatalog>> {
        if let Some(catalog) = self.catalog.read().await.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let mut slot = self.catalog.write().await;
        if let Some(catalog) = slot.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let catalog = match self.store.load().await {
            Ok(Some(catalog)) => {
                debug!(tables = catalog.table_count(), "loaded type catalog");
                catalog
            }
            Ok(None) => {
                debug!("no persisted type catalog");
                TypeCatalog::new()
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable type catalog");
                TypeCatalog::new()
            }
        };

        let catalog = Arc::new(catalog);
        *slot = Some(Arc::clone(&catalog));
        Ok(catalog)
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::TypeCatalog;
use crate::error::{Result, SchemaBindError};
use crate::traits::CatalogStore;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Catalog store backed by a single JSON file.
///
/// The document is `{ table: { column: code } }`. Saves write a sibling
/// temp file and rename it over the target, so a concurrent reader sees
/// either the previous document or the new one.
#[derive(Debug, Clone)]
pub struct FileCatalogStore {
    path: PathBuf,
}

impl FileCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string());
        let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            unique
        ))
    }
}

#[async_trait]
impl CatalogStore for FileCatalogStore {
    async fn load(&self) -> Result<Option<TypeCatalog>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SchemaBindError::CatalogStore(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let catalog: TypeCatalog = serde_json::from_slice(&bytes).map_err(|e| {
            SchemaBindError::CatalogStore(format!("parsing {}: {}", self.path.display(), e))
        })?;
        Ok(Some(catalog.normalized()))
    }

    async fn save(&self, catalog: &TypeCatalog) -> Result<()> {
        let store_err = |e: std::io::Error| {
            SchemaBindError::CatalogStore(format!("writing {}: {}", self.path.display(), e))
        };

        let json = serde_json::to_vec_pretty(catalog)
            .map_err(|e| SchemaBindError::CatalogStore(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(store_err)?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &json).await.map_err(store_err)?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                debug!(
                    path = %temp.display(),
                    error = %cleanup,
                    "failed to remove temp catalog file"
                );
            }
            return Err(store_err(e));
        }

        debug!(
            path = %self.path.display(),
            tables = catalog.table_count(),
            "saved type catalog"
        );
        Ok(())
    }
}

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::catalog::{TypeCatalog, METADATA_COLUMN, METADATA_TABLE};
use crate::error::Result;
use crate::resolver::metadata_bind_types;
use crate::traits::{CatalogStore, DatabaseDriver};
use crate::types::{BindParameter, BindType, SqlValue};

/// Rebuilds the type catalog from live schema metadata.
///
/// One rebuild is one metadata query for every `(table, column, data_type)`
/// triple in the configured schema, followed by a save of the complete
/// result. This is the expensive path; it only runs when a resolution misses.
pub struct SchemaIntrospector {
    driver: Arc<dyn DatabaseDriver>,
    store: Arc<dyn CatalogStore>,
    schema: String,
}

impl SchemaIntrospector {
    pub fn new(
        driver: Arc<dyn DatabaseDriver>,
        store: Arc<dyn CatalogStore>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            store,
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn metadata_query(&self) -> String {
        format!(
            "SELECT table_name AS table_name, column_name AS column_name, data_type AS data_type \
             FROM {} WHERE {} = {}",
            METADATA_TABLE,
            METADATA_COLUMN,
            self.driver.placeholder(1)
        )
    }

    /// Derive a fresh catalog from the database and persist it.
    pub async fn rebuild(&self) -> Result<TypeCatalog> {
        let started = Instant::now();
        info!(schema = %self.schema, "rebuilding type catalog");

        let columns = [METADATA_COLUMN];
        let types = metadata_bind_types(&columns)?;
        let params = columns
            .iter()
            .zip(types)
            .map(|(column, bind_type)| {
                BindParameter::new(*column, bind_type, SqlValue::Text(self.schema.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let raw = self.driver.query(&self.metadata_query(), &params).await?;

        let mut catalog = TypeCatalog::new();
        let mut skipped = 0usize;
        for row in raw.into_rows() {
            let (Some(table), Some(column), Some(native)) = (
                row.get_str("table_name")?,
                row.get_str("column_name")?,
                row.get_str("data_type")?,
            ) else {
                warn!(?row, "skipping metadata row with non-text fields");
                continue;
            };

            let bind_type = BindType::from_native_type(native);
            if !catalog.insert(table, column, bind_type) {
                debug!(table, column, native, "no bind type for native type");
                skipped += 1;
            }
        }

        self.store.save(&catalog).await?;

        info!(
            tables = catalog.table_count(),
            columns = catalog.column_count(),
            skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "type catalog rebuilt"
        );
        Ok(catalog)
    }
}

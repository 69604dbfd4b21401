use std::sync::Arc;

use crate::config::Config;
use crate::drivers::TokioPostgresDriver;
use crate::error::Result;
use crate::executor::StatementExecutor;
use crate::introspector::SchemaIntrospector;
use crate::resolver::TypeResolver;
use crate::stores::FileCatalogStore;
use crate::traits::{CatalogStore, DatabaseDriver};
use crate::types::{QuerySpec, Row, SqlValue};

/// Main entry point for schemabind.
/// Executes statements whose parameters are typed from the cached schema.
pub struct SchemaBindClient {
    resolver: Arc<TypeResolver>,
    executor: StatementExecutor,
}

impl SchemaBindClient {
    /// Connect to PostgreSQL and cache column types at the configured path.
    ///
    /// # Example
    /// ```ignore
    /// let config = Config::from_file(Path::new("schemabind.toml"))?;
    /// let client = SchemaBindClient::connect(&config).await?;
    /// ```
    pub async fn connect(config: &Config) -> Result<Self> {
        let driver = TokioPostgresDriver::connect(&config.database).await?;
        let store = FileCatalogStore::new(config.catalog.cache_path.clone());
        Ok(Self::with_parts(
            Arc::new(driver),
            Arc::new(store),
            config.database.schema.clone(),
        ))
    }

    /// Create a new client from custom collaborators.
    /// Useful for testing or using alternative database drivers.
    pub fn with_parts(
        driver: Arc<dyn DatabaseDriver>,
        store: Arc<dyn CatalogStore>,
        schema: impl Into<String>,
    ) -> Self {
        let introspector = SchemaIntrospector::new(Arc::clone(&driver), Arc::clone(&store), schema);
        let resolver = Arc::new(TypeResolver::new(store, introspector));
        let executor = StatementExecutor::new(driver, Arc::clone(&resolver));
        Self { resolver, executor }
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn executor(&self) -> &StatementExecutor {
        &self.executor
    }

    /// Run a read, binding each `(column, value)` pair in order.
    ///
    /// # Example
    /// ```ignore
    /// let rows = client
    ///     .get_data_assoc(
    ///         "SELECT * FROM orders WHERE total > $1",
    ///         "orders",
    ///         [("total", 10.0)],
    ///     )
    ///     .await?;
    /// ```
    pub async fn get_data_assoc<K, V, I>(&self, query: &str, table: &str, column_values: I) -> Result<Vec<Row>>
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let spec = QuerySpec::from_pairs(query, table, column_values);
        self.executor.query(&spec).await
    }

    /// Run a write, binding each `(column, value)` pair in order.
    /// Returns the generated identifier, if the statement produced one.
    pub async fn set_data_assoc<K, V, I>(&self, query: &str, table: &str, column_values: I) -> Result<Option<i64>>
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let spec = QuerySpec::from_pairs(query, table, column_values);
        self.executor.write(&spec).await
    }

    /// Run a read with parallel column and value lists.
    pub async fn get_data(
        &self,
        query: &str,
        table: &str,
        columns: Vec<String>,
        values: Vec<SqlValue>,
    ) -> Result<Vec<Row>> {
        let spec = QuerySpec::from_parts(query, table, columns, values);
        self.executor.query(&spec).await
    }

    /// Run a write with parallel column and value lists.
    pub async fn set_data(
        &self,
        query: &str,
        table: &str,
        columns: Vec<String>,
        values: Vec<SqlValue>,
    ) -> Result<Option<i64>> {
        let spec = QuerySpec::from_parts(query, table, columns, values);
        self.executor.write(&spec).await
    }
}

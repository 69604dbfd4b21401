use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::resolver::TypeResolver;
use crate::traits::DatabaseDriver;
use crate::types::{BindParameter, QuerySpec, Row};

/// What the driver should do with a bound statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    /// Return every result row.
    Query,
    /// Return the generated identifier.
    Write,
}

/// Outcome of [`StatementExecutor::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    Rows(Vec<Row>),
    Written(Option<i64>),
}

/// Binds schema-typed parameters into statements and executes them.
pub struct StatementExecutor {
    driver: Arc<dyn DatabaseDriver>,
    resolver: Arc<TypeResolver>,
}

impl StatementExecutor {
    pub fn new(driver: Arc<dyn DatabaseDriver>, resolver: Arc<TypeResolver>) -> Self {
        Self { driver, resolver }
    }

    /// Execute a read and materialize all of its rows.
    pub async fn query(&self, spec: &QuerySpec) -> Result<Vec<Row>> {
        match self.run(ExecutionKind::Query, spec).await? {
            Execution::Rows(rows) => Ok(rows),
            Execution::Written(_) => Ok(Vec::new()),
        }
    }

    /// Execute a write and return the generated identifier, if any.
    pub async fn write(&self, spec: &QuerySpec) -> Result<Option<i64>> {
        match self.run(ExecutionKind::Write, spec).await? {
            Execution::Written(id) => Ok(id),
            Execution::Rows(_) => Ok(None),
        }
    }

    /// Validate, resolve, bind and execute `spec` as `kind`.
    pub async fn run(&self, kind: ExecutionKind, spec: &QuerySpec) -> Result<Execution> {
        let params = self.bind(spec).await?;
        debug!(?kind, table = %spec.table, params = params.len(), "executing statement");

        match kind {
            ExecutionKind::Query => {
                let raw = self.driver.query(&spec.query, &params).await?;
                Ok(Execution::Rows(raw.into_rows()))
            }
            ExecutionKind::Write => {
                let id = self.driver.execute(&spec.query, &params).await?;
                Ok(Execution::Written(id))
            }
        }
    }

    /// Resolve the type of every column and pair it with its value, in order.
    pub async fn bind(&self, spec: &QuerySpec) -> Result<Vec<BindParameter>> {
        spec.validate()?;
        let types = self.resolver.resolve(&spec.table, &spec.columns).await?;

        spec.columns
            .iter()
            .zip(types)
            .zip(spec.values.iter().cloned())
            .map(|((column, bind_type), value)| BindParameter::new(column.as_str(), bind_type, value))
            .collect()
    }
}

use crate::error::{Result, SchemaBindError};
use crate::types::SqlValue;

/// A statement together with the table whose schema types its parameters.
///
/// `columns[i]` names the column whose type is used to bind `values[i]`,
/// and the pairs bind to placeholders in this order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub query: String,
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<SqlValue>,
}

impl QuerySpec {
    /// Start a spec with no parameters.
    pub fn new(query: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a spec from ordered `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(query: impl Into<String>, table: impl Into<String>, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            query: query.into(),
            table: table.into(),
            columns,
            values,
        }
    }

    /// Build a spec from parallel column and value lists.
    /// The lengths are checked by [`QuerySpec::validate`], not here.
    pub fn from_parts(
        query: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<String>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            query: query.into(),
            table: table.into(),
            columns,
            values,
        }
    }

    /// Append one parameter.
    pub fn bind(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.len() != self.values.len() {
            return Err(SchemaBindError::SchemaMismatch {
                columns: self.columns.len(),
                values: self.values.len(),
            });
        }
        Ok(())
    }
}

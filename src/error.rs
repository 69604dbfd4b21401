use thiserror::Error;

use crate::types::BindType;

/// Error type for schemabind operations
#[derive(Debug, Error)]
pub enum SchemaBindError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Prepare failed: {0}")]
    PrepareFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("No bind type for column {table}.{column}")]
    UnresolvedColumn { table: String, column: String },

    #[error("Got {columns} column(s) but {values} value(s)")]
    SchemaMismatch { columns: usize, values: usize },

    #[error("Cannot bind value for column {column} as {bind_type:?}: {reason}")]
    InvalidValue {
        column: String,
        bind_type: BindType,
        reason: String,
    },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Catalog store error: {0}")]
    CatalogStore(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SchemaBindError {
    pub(crate) fn unresolved(table: &str, column: &str) -> Self {
        SchemaBindError::UnresolvedColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Result type alias for schemabind operations
pub type Result<T> = std::result::Result<T, SchemaBindError>;

//! schemabind - Schema-typed parameter binding for raw SQL
//!
//! Callers pass query text, a table name and `(column, value)` pairs; the
//! bind type of every value comes from a cached catalog of the database's
//! column types, which rebuilds itself from `information_schema` when a
//! table or column is missing.
//!
//! # Example
//! ```ignore
//! use schemabind::{Config, SchemaBindClient};
//!
//! let client = SchemaBindClient::connect(&Config::default()).await?;
//!
//! let id = client
//!     .set_data_assoc(
//!         "INSERT INTO orders (customer, total) VALUES ($1, $2) RETURNING id",
//!         "orders",
//!         [("customer", SqlValue::from("ACME")), ("total", SqlValue::from(19.99))],
//!     )
//!     .await?;
//!
//! let rows = client
//!     .get_data_assoc("SELECT * FROM orders WHERE total > $1", "orders", [("total", 10.0)])
//!     .await?;
//! ```

pub mod catalog;
pub mod config;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod introspector;
pub mod resolver;
pub mod stores;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use catalog::{TypeCatalog, METADATA_COLUMN, METADATA_TABLE};
pub use client::SchemaBindClient;
pub use config::{CatalogConfig, Config, ConnectionConfig};
pub use error::{Result, SchemaBindError};
pub use executor::{Execution, ExecutionKind, StatementExecutor};
pub use introspector::SchemaIntrospector;
pub use resolver::TypeResolver;
pub use traits::{CatalogStore, DatabaseDriver};
pub use types::{BindParameter, BindType, QuerySpec, RawQueryResult, Row, SqlValue};

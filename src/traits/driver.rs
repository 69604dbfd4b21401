use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BindParameter, RawQueryResult};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database
/// - Preparing statements and rejecting malformed ones
/// - Encoding each BindParameter according to its BindType
/// - Executing statements and converting results to RawQueryResult
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Prepare `sql`, bind `params` positionally and return every result row.
    async fn query(&self, sql: &str, params: &[BindParameter]) -> Result<RawQueryResult>;

    /// Prepare `sql`, bind `params` positionally and execute it.
    /// Returns the identifier generated by the statement, if any.
    async fn execute(&self, sql: &str, params: &[BindParameter]) -> Result<Option<i64>>;

    /// Placeholder text for the 1-indexed parameter `position`.
    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }
}

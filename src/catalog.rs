//! Cached schema metadata: table -> column -> bind type.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::BindType;

/// The database's own column metadata table.
///
/// Resolutions against it never consult the catalog, which lets the
/// introspector issue a parameterized metadata query while rebuilding.
pub const METADATA_TABLE: &str = "information_schema.columns";

/// The only column of [`METADATA_TABLE`] that may be bound.
pub const METADATA_COLUMN: &str = "table_schema";

/// Returns true if `table` names the metadata table, ignoring case.
pub fn is_metadata_table(table: &str) -> bool {
    table.eq_ignore_ascii_case(METADATA_TABLE)
}

/// Mapping from table name to column name to bind type.
///
/// Every key is stored lowercase and every lookup lowercases its input.
/// Columns whose native type has no bind type are remembered separately
/// and look up as `BindType::Unknown`; they are not part of the persisted
/// document, which only carries `i`, `s`, `d` and `b` codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCatalog {
    tables: HashMap<String, HashMap<String, BindType>>,
    #[serde(skip)]
    unresolvable: HashSet<(String, String)>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the type of `table.column`.
    /// Returns false for `BindType::Unknown`, which is only remembered in
    /// memory.
    pub fn insert(&mut self, table: &str, column: &str, bind_type: BindType) -> bool {
        if !bind_type.is_known() {
            self.unresolvable
                .insert((table.to_lowercase(), column.to_lowercase()));
            return false;
        }
        self.tables
            .entry(table.to_lowercase())
            .or_default()
            .insert(column.to_lowercase(), bind_type);
        true
    }

    /// Looks up the type of `table.column`. Absence is `None`, not an error;
    /// a column known to have no bind type is `Some(BindType::Unknown)`.
    pub fn lookup(&self, table: &str, column: &str) -> Option<BindType> {
        let key = (table.to_lowercase(), column.to_lowercase());
        if self.unresolvable.contains(&key) {
            return Some(BindType::Unknown);
        }
        self.tables.get(&key.0)?.get(&key.1).copied()
    }

    pub fn contains_table(&self, table: &str) -> bool {
        let table = table.to_lowercase();
        self.tables.contains_key(&table) || self.unresolvable.iter().any(|(t, _)| *t == table)
    }

    /// Resolves every column in order, or returns the first column missing
    /// from the catalog. Known-unresolvable columns come back as `Unknown`.
    pub fn lookup_all<'a, S: AsRef<str>>(
        &self,
        table: &str,
        columns: &'a [S],
    ) -> std::result::Result<Vec<BindType>, &'a str> {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                self.lookup(table, column).ok_or(column)
            })
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    /// Number of columns remembered as having no bind type.
    pub fn unresolvable_count(&self) -> usize {
        self.unresolvable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.unresolvable.is_empty()
    }

    /// Re-normalizes keys of a catalog deserialized from an external document.
    pub(crate) fn normalized(self) -> Self {
        let mut catalog = TypeCatalog::new();
        for (table, columns) in self.tables {
            for (column, bind_type) in columns {
                catalog.insert(&table, &column, bind_type);
            }
        }
        catalog
    }
}

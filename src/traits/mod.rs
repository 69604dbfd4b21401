mod catalog_store;
mod driver;

pub use catalog_store::CatalogStore;
pub use driver::DatabaseDriver;

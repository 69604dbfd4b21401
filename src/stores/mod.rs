mod file;
mod in_memory;

pub use self::file::FileCatalogStore;
pub use self::in_memory::InMemoryCatalogStore;

//! Connection and catalog configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [database]
//! host = "db.internal"
//! user = "app"
//! password = "secret"
//! database = "shop"
//!
//! [catalog]
//! cache_path = "/var/cache/shop/schema_types.json"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaBindError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: ConnectionConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Where and as whom to connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    /// Never written back out.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    #[serde(default)]
    pub database: String,

    /// Schema whose tables are introspected.
    #[serde(default = "default_schema")]
    pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("schema_types.json")
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: None,
            database: String::new(),
            schema: default_schema(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaBindError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SchemaBindError::Config(e.to_string()))
    }
}

impl ConnectionConfig {
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.database);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

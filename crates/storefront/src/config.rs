//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MAGASIN_DATABASE_URL` - `SQLite` URL of the local store (default: `sqlite://magasin.db`,
//!   `sqlite::memory:` for a throwaway store)
//! - `MAGASIN_SEED_FILE` - JSON product feed replacing the built-in catalog
//! - `MAGASIN_MAX_CONNECTIONS` - Connection pool size (default: 4, forced to 1 in memory)

use std::path::PathBuf;

use thiserror::Error;

use crate::db::seed::{self, SeedError};
use crate::models::Product;

const DEFAULT_DATABASE_URL: &str = "sqlite://magasin.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// `SQLite` URL of the local store.
    pub database_url: String,
    /// Product feed overriding the built-in catalog.
    pub seed_file: Option<PathBuf>,
    /// Connection pool size for file-backed stores.
    pub max_connections: u32,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            seed_file: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set to an
    /// unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("MAGASIN_DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidEnvVar(
                "MAGASIN_DATABASE_URL".to_owned(),
                "must be a sqlite: URL".to_owned(),
            ));
        }

        let seed_file = lookup("MAGASIN_SEED_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let max_connections = match lookup("MAGASIN_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => parse_max_connections(&raw)?,
        };

        Ok(Self {
            database_url,
            seed_file,
            max_connections,
        })
    }

    /// The product feed to seed an empty store with.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the configured feed cannot be read or parsed.
    pub async fn load_catalog(&self) -> Result<Vec<Product>, SeedError> {
        match &self.seed_file {
            Some(path) => seed::from_file(path).await,
            None => seed::catalog(),
        }
    }
}

fn parse_max_connections(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("MAGASIN_MAX_CONNECTIONS".to_owned(), reason);

    let value = raw.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if value == 0 {
        return Err(invalid("must be at least 1".to_owned()));
    }
    Ok(value)
}

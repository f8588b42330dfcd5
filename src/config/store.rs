use std::env;

use crate::services::password::PasswordStorage;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://users_db.sqlite";
pub const DEFAULT_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error(transparent)]
    PasswordStorage(#[from] crate::services::password::UnknownPasswordStorage),
}

/// Settings for opening a credential store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    /// Bumping this drops and recreates the users table on the next
    /// `initialize`.
    pub schema_version: i64,
    pub password_storage: PasswordStorage,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION,
            password_storage: PasswordStorage::default(),
            max_connections: 1,
        }
    }
}

impl StoreConfig {
    /// In-memory store, mostly useful for tests.
    pub fn in_memory() -> Self {
        StoreConfig {
            database_url: "sqlite::memory:".to_string(),
            ..StoreConfig::default()
        }
    }

    pub fn with_schema_version(mut self, version: i64) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_password_storage(mut self, storage: PasswordStorage) -> Self {
        self.password_storage = storage;
        self
    }

    /// Read overrides from `DATABASE_URL`, `CREDSTORE_SCHEMA_VERSION`,
    /// `CREDSTORE_PASSWORD_STORAGE` and `CREDSTORE_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = StoreConfig::default();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.database_url);

        let schema_version = match env::var("CREDSTORE_SCHEMA_VERSION") {
            Ok(value) => parse_positive("CREDSTORE_SCHEMA_VERSION", &value)?,
            Err(_) => defaults.schema_version,
        };

        let password_storage = match env::var("CREDSTORE_PASSWORD_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.password_storage,
        };

        let max_connections = match env::var("CREDSTORE_MAX_CONNECTIONS") {
            Ok(value) => parse_positive("CREDSTORE_MAX_CONNECTIONS", &value)? as u32,
            Err(_) => defaults.max_connections,
        };

        Ok(StoreConfig {
            database_url,
            schema_version,
            password_storage,
            max_connections,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<i64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 && n <= i64::from(u32::MAX) => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

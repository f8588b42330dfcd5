pub mod test_helpers {
    use crate::config::StoreConfig;
    use crate::db;
    use crate::repositories::SqliteUserRepository;
    use crate::services::{CredentialStore, PasswordStorage};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        db::create_pool(&StoreConfig::in_memory()).await
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when a test needs to reopen the same database
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let config = file_config(&temp_file)?;
        let pool = db::create_pool(&config).await?;
        Ok((pool, temp_file))
    }

    /// Store config pointing at an existing temporary file
    pub fn file_config(temp_file: &NamedTempFile) -> Result<StoreConfig, sqlx::Error> {
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        Ok(StoreConfig {
            database_url: format!("sqlite://{}", db_path),
            ..StoreConfig::default()
        })
    }

    /// Build and initialize a store over `pool`
    pub async fn create_test_store(
        pool: SqlitePool,
        schema_version: i64,
        password_storage: PasswordStorage,
    ) -> Result<Arc<CredentialStore>, crate::error::StoreError> {
        let repository = Arc::new(SqliteUserRepository::new(pool));
        let store = CredentialStore::new(repository, schema_version, password_storage);
        store.initialize().await?;
        Ok(Arc::new(store))
    }

    /// Insert a user row directly, bypassing the store
    pub async fn insert_test_user(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(password)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Raw `password` column for `email`
    pub async fn stored_password(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}

use crate::models::user::User;
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("User already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
"#;

const CREATE_META_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS store_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
"#;

const PASSWORD_STORAGE_KEY: &str = "password_storage";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// Version stamped into the database, 0 for a fresh file.
    async fn schema_version(&self) -> RepositoryResult<i64>;
    /// Create the users and meta tables if missing and stamp `version`.
    async fn create_schema(&self, version: i64) -> RepositoryResult<()>;
    /// Drop both tables, recreate them empty and stamp `version`.
    async fn recreate_schema(&self, version: i64) -> RepositoryResult<()>;
    /// Password storage mode the users table was written with, if stamped.
    async fn password_storage_mode(&self) -> RepositoryResult<Option<String>>;
    async fn set_password_storage_mode(&self, mode: &str) -> RepositoryResult<()>;
    async fn email_exists(&self, email: &str) -> RepositoryResult<bool>;
    async fn create_user(&self, name: &str, email: &str, password: &str)
        -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> RepositoryResult<Option<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn schema_version(&self) -> RepositoryResult<i64> {
        let version = sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    async fn create_schema(&self, version: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_USERS_TABLE).execute(&mut *tx).await?;
        sqlx::query(CREATE_META_TABLE).execute(&mut *tx).await?;
        // PRAGMA does not take bound parameters; version is an integer.
        sqlx::query(&format!("PRAGMA user_version = {}", version))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn recreate_schema(&self, version: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DROP TABLE IF EXISTS users")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS store_meta")
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_USERS_TABLE).execute(&mut *tx).await?;
        sqlx::query(CREATE_META_TABLE).execute(&mut *tx).await?;
        sqlx::query(&format!("PRAGMA user_version = {}", version))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn password_storage_mode(&self) -> RepositoryResult<Option<String>> {
        let mode = sqlx::query_scalar::<_, String>("SELECT value FROM store_meta WHERE key = ?")
            .bind(PASSWORD_STORAGE_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mode)
    }

    async fn set_password_storage_mode(&self, mode: &str) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO store_meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(PASSWORD_STORAGE_KEY)
        .bind(mode)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> RepositoryResult<User> {
        let result = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(password)
            .execute(&self.pool)
            .await;

        match result {
            // The row is written; build it from the inputs instead of reading it back
            Ok(res) => Ok(User {
                id: res.last_insert_rowid(),
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            }),
            Err(e) => {
                let unique = e
                    .as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if unique {
                    Err(RepositoryError::AlreadyExists)
                } else {
                    Err(RepositoryError::Database(e))
                }
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password
            FROM users
            WHERE email = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password
            FROM users
            WHERE email = ? AND password = ?
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

use crate::config::StoreConfig;
use crate::db;
use crate::error::{RegisterOutcome, Result, StoreError};
use crate::models::user::User;
use crate::repositories::user_repository::{SqliteUserRepository, UserRepository};
use crate::services::password::PasswordStorage;
use std::sync::Arc;

/// Persists user records and answers existence and credential queries.
///
/// Every operation comes in two forms. The typed form (`check_email`,
/// `create_user`, `check_credentials`, `find_name`) returns `StoreError`
/// on failure. The compatibility form (`email_exists`, `register`,
/// `verify_credentials`, `lookup_name`) logs the failure and answers with
/// a negative result instead, so a caller cannot tell "not found" from a
/// storage fault.
pub struct CredentialStore {
    repository: Arc<dyn UserRepository>,
    schema_version: i64,
    password_storage: PasswordStorage,
}

impl CredentialStore {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        schema_version: i64,
        password_storage: PasswordStorage,
    ) -> Self {
        Self {
            repository,
            schema_version,
            password_storage,
        }
    }

    pub fn from_config(repository: Arc<dyn UserRepository>, config: &StoreConfig) -> Self {
        Self::new(repository, config.schema_version, config.password_storage)
    }

    /// Connect to the configured database and run `initialize`.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        let repository = Arc::new(SqliteUserRepository::new(pool));
        let store = Self::from_config(repository, config);
        store.initialize().await?;
        Ok(store)
    }

    pub fn schema_version(&self) -> i64 {
        self.schema_version
    }

    pub fn password_storage(&self) -> PasswordStorage {
        self.password_storage
    }

    /// Ensure the users table exists at the configured schema version.
    ///
    /// A lower stored version drops the table and every record in it. The
    /// password storage mode is stamped on first use and must match on
    /// every later open.
    pub async fn initialize(&self) -> Result<()> {
        if self.schema_version < 1 {
            return Err(StoreError::InvalidSchemaVersion(self.schema_version));
        }

        let stored = self.repository.schema_version().await?;

        if stored > self.schema_version {
            tracing::error!(
                "Refusing to downgrade schema from version {} to {}",
                stored,
                self.schema_version
            );
            return Err(StoreError::SchemaDowngrade {
                stored,
                requested: self.schema_version,
            });
        }

        if stored != 0 && stored < self.schema_version {
            tracing::info!(
                "Upgrading schema from version {} to {}: dropping users table",
                stored,
                self.schema_version
            );
            self.repository.recreate_schema(self.schema_version).await?;
        } else {
            self.repository.create_schema(self.schema_version).await?;
        }

        let requested = self.password_storage.to_string();
        match self.repository.password_storage_mode().await? {
            None => self.repository.set_password_storage_mode(&requested).await?,
            Some(mode) if mode == requested => {}
            Some(mode) => {
                tracing::error!(
                    "Database stores {} passwords, refusing to open in {} mode",
                    mode,
                    requested
                );
                return Err(StoreError::PasswordStorageMismatch {
                    stored: mode,
                    requested,
                });
            }
        }

        tracing::debug!("Users table ready at schema version {}", self.schema_version);
        Ok(())
    }

    pub async fn check_email(&self, email: &str) -> Result<bool> {
        let exists = self.repository.email_exists(email).await?;
        tracing::debug!(
            "Check email {}: {}",
            email,
            if exists { "exists" } else { "not exists" }
        );
        Ok(exists)
    }

    pub async fn email_exists(&self, email: &str) -> bool {
        match self.check_email(email).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::error!("Error checking email existence: {}", e);
                false
            }
        }
    }

    /// Insert a new record. Relies on the unique constraint alone to
    /// reject a taken email.
    pub async fn create_user(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let stored_password = self
            .password_storage
            .encode(password)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        let user = self
            .repository
            .create_user(name, email, &stored_password)
            .await?;
        tracing::debug!("User registered successfully: {}", email);
        Ok(user)
    }

    /// Register a user after an optimistic existence check.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> RegisterOutcome {
        match self.check_email(email).await {
            Ok(true) => {
                tracing::debug!("Registration failed: email {} already exists", email);
                return RegisterOutcome::AlreadyExists;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Error checking email existence: {}", e);
                return RegisterOutcome::StorageFault;
            }
        }

        match self.create_user(name, email, password).await {
            Ok(_) => RegisterOutcome::Success,
            Err(e) if e.is_already_exists() => {
                tracing::debug!("Registration lost race: email {} already exists", email);
                RegisterOutcome::AlreadyExists
            }
            Err(e) => {
                tracing::error!("Error inserting user {}: {}", email, e);
                RegisterOutcome::StorageFault
            }
        }
    }

    /// The record whose email and password both match, if any.
    pub async fn check_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = match self.password_storage {
            PasswordStorage::Plaintext => {
                self.repository.find_by_credentials(email, password).await?
            }
            PasswordStorage::Argon2 => self
                .repository
                .find_by_email(email)
                .await?
                .filter(|user| self.password_storage.matches(password, &user.password)),
        };

        tracing::debug!(
            "Check user {}: {}",
            email,
            if user.is_some() { "valid" } else { "invalid" }
        );
        Ok(user)
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> bool {
        match self.check_credentials(email, password).await {
            Ok(user) => user.is_some(),
            Err(e) => {
                tracing::error!("Error checking user credentials: {}", e);
                false
            }
        }
    }

    pub async fn find_name(&self, email: &str) -> Result<Option<String>> {
        let name = self
            .repository
            .find_by_email(email)
            .await?
            .map(|user| user.name);
        match &name {
            Some(name) => tracing::debug!("Name found for {}: {}", email, name),
            None => tracing::debug!("No name found for email: {}", email),
        }
        Ok(name)
    }

    pub async fn lookup_name(&self, email: &str) -> Option<String> {
        match self.find_name(email).await {
            Ok(name) => name,
            Err(e) => {
                tracing::error!("Error getting name by email: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::{MockUserRepository, RepositoryError};
    use mockall::predicate::*;

    fn storage_fault() -> RepositoryError {
        RepositoryError::Database(sqlx::Error::PoolClosed)
    }

    fn plaintext_store(mock_repo: MockUserRepository) -> CredentialStore {
        CredentialStore::new(Arc::new(mock_repo), 1, PasswordStorage::Plaintext)
    }

    #[tokio::test]
    async fn test_initialize_fresh_database_creates_schema() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_schema_version()
            .times(1)
            .returning(|| Box::pin(async move { Ok(0) }));
        mock_repo
            .expect_create_schema()
            .with(eq(1))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));
        mock_repo.expect_recreate_schema().never();
        mock_repo
            .expect_password_storage_mode()
            .returning(|| Box::pin(async move { Ok(None) }));
        mock_repo
            .expect_set_password_storage_mode()
            .with(eq("plaintext"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));

        let store = plaintext_store(mock_repo);
        assert!(store.initialize().await.is_ok());
    }

    #[tokio::test]
    async fn test_initialize_older_version_recreates_schema() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_schema_version()
            .returning(|| Box::pin(async move { Ok(1) }));
        mock_repo
            .expect_recreate_schema()
            .with(eq(2))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));
        mock_repo.expect_create_schema().never();
        mock_repo
            .expect_password_storage_mode()
            .returning(|| Box::pin(async move { Ok(None) }));
        mock_repo
            .expect_set_password_storage_mode()
            .returning(|_| Box::pin(async move { Ok(()) }));

        let store = CredentialStore::new(Arc::new(mock_repo), 2, PasswordStorage::Plaintext);
        assert!(store.initialize().await.is_ok());
    }

    #[tokio::test]
    async fn test_initialize_refuses_downgrade() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_schema_version()
            .returning(|| Box::pin(async move { Ok(5) }));

        let store = plaintext_store(mock_repo);
        let result = store.initialize().await;
        assert!(matches!(
            result,
            Err(StoreError::SchemaDowngrade {
                stored: 5,
                requested: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_initialize_rejects_version_below_one() {
        for version in [0, -1] {
            let mut mock_repo = MockUserRepository::new();
            mock_repo.expect_schema_version().never();
            mock_repo.expect_create_schema().never();

            let store =
                CredentialStore::new(Arc::new(mock_repo), version, PasswordStorage::Plaintext);
            let result = store.initialize().await;
            assert!(matches!(
                result,
                Err(StoreError::InvalidSchemaVersion(v)) if v == version
            ));
        }
    }

    #[tokio::test]
    async fn test_initialize_refuses_other_password_storage_mode() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_schema_version()
            .returning(|| Box::pin(async move { Ok(1) }));
        mock_repo
            .expect_create_schema()
            .returning(|_| Box::pin(async move { Ok(()) }));
        mock_repo
            .expect_password_storage_mode()
            .returning(|| Box::pin(async move { Ok(Some("plaintext".to_string())) }));
        mock_repo.expect_set_password_storage_mode().never();

        let store = CredentialStore::new(Arc::new(mock_repo), 1, PasswordStorage::Argon2);
        let result = store.initialize().await;
        assert!(matches!(
            result,
            Err(StoreError::PasswordStorageMismatch { ref stored, ref requested })
                if stored == "plaintext" && requested == "argon2"
        ));
    }

    #[tokio::test]
    async fn test_email_exists_collapses_fault_to_false() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_email_exists()
            .with(eq("alice@example.com"))
            .times(2)
            .returning(|_| Box::pin(async move { Err(storage_fault()) }));

        let store = plaintext_store(mock_repo);
        assert!(!store.email_exists("alice@example.com").await);
        assert!(store.check_email("alice@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_register_taken_email_skips_insert() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_email_exists()
            .returning(|_| Box::pin(async move { Ok(true) }));
        mock_repo.expect_create_user().never();

        let store = plaintext_store(mock_repo);
        let outcome = store.register("Alice", "alice@example.com", "secret1").await;
        assert_eq!(outcome, RegisterOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_register_race_reports_already_exists() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_email_exists()
            .returning(|_| Box::pin(async move { Ok(false) }));
        mock_repo
            .expect_create_user()
            .times(1)
            .returning(|_, _, _| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let store = plaintext_store(mock_repo);
        let outcome = store.register("Alice", "alice@example.com", "secret1").await;
        assert_eq!(outcome, RegisterOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_register_write_fault_reports_storage_fault() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_email_exists()
            .returning(|_| Box::pin(async move { Ok(false) }));
        mock_repo
            .expect_create_user()
            .returning(|_, _, _| Box::pin(async move { Err(storage_fault()) }));

        let store = plaintext_store(mock_repo);
        let outcome = store.register("Alice", "alice@example.com", "secret1").await;
        assert_eq!(outcome, RegisterOutcome::StorageFault);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_register_check_fault_reports_storage_fault() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_email_exists()
            .returning(|_| Box::pin(async move { Err(storage_fault()) }));
        mock_repo.expect_create_user().never();

        let store = plaintext_store(mock_repo);
        let outcome = store.register("Alice", "alice@example.com", "secret1").await;
        assert_eq!(outcome, RegisterOutcome::StorageFault);
    }

    #[tokio::test]
    async fn test_plaintext_register_stores_raw_password() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_email_exists()
            .returning(|_| Box::pin(async move { Ok(false) }));
        mock_repo
            .expect_create_user()
            .with(eq("Alice"), eq("alice@example.com"), eq("secret1"))
            .times(1)
            .returning(|name, email, password| {
                let user = User {
                    id: 1,
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                };
                Box::pin(async move { Ok(user) })
            });

        let store = plaintext_store(mock_repo);
        let outcome = store.register("Alice", "alice@example.com", "secret1").await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_plaintext_verify_uses_credential_query() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_credentials()
            .with(eq("alice@example.com"), eq("secret1"))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(None) }));
        mock_repo.expect_find_by_email().never();

        let store = plaintext_store(mock_repo);
        assert!(!store.verify_credentials("alice@example.com", "secret1").await);
    }

    #[tokio::test]
    async fn test_verify_collapses_fault_to_false() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_credentials()
            .returning(|_, _| Box::pin(async move { Err(storage_fault()) }));

        let store = plaintext_store(mock_repo);
        assert!(!store.verify_credentials("alice@example.com", "secret1").await);
    }

    #[tokio::test]
    async fn test_argon2_verify_checks_hash() {
        let hash = PasswordStorage::Argon2.encode("secret1").unwrap();
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_email().times(2).returning(move |_| {
            let user = User {
                id: 1,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password: hash.clone(),
            };
            Box::pin(async move { Ok(Some(user)) })
        });
        mock_repo.expect_find_by_credentials().never();

        let store = CredentialStore::new(Arc::new(mock_repo), 1, PasswordStorage::Argon2);
        assert!(store.verify_credentials("alice@example.com", "secret1").await);
        assert!(!store.verify_credentials("alice@example.com", "secret2").await);
    }

    #[tokio::test]
    async fn test_lookup_name_collapses_fault_to_none() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async move { Err(storage_fault()) }));

        let store = plaintext_store(mock_repo);
        assert_eq!(store.lookup_name("alice@example.com").await, None);
        assert!(store.find_name("alice@example.com").await.is_err());
    }
}

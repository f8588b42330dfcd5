use crate::repositories::user_repository::RepositoryError;
use thiserror::Error;

// Type alias for Result with our StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the credential store.
///
/// The boolean-returning operations on `CredentialStore` log these and
/// collapse them into negative results. The typed operations hand them
/// back unchanged so callers can tell a missing record from a broken
/// database.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Repository operation failed
    ///
    /// Covers SQLx faults as well as the unique-constraint violation that
    /// surfaces as `RepositoryError::AlreadyExists`.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The database carries a newer schema than this build understands
    #[error("Cannot downgrade schema from version {stored} to {requested}")]
    SchemaDowngrade { stored: i64, requested: i64 },

    /// Schema versions start at 1; 0 is reserved for a fresh database
    #[error("Invalid schema version {0}: versions start at 1")]
    InvalidSchemaVersion(i64),

    /// The database was created with a different password storage mode
    #[error("Database stores {stored} passwords but the store was opened in {requested} mode")]
    PasswordStorageMismatch { stored: String, requested: String },

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Repository(RepositoryError::Database(err))
    }
}

impl StoreError {
    /// True when the error is the natural-key uniqueness violation.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::Repository(RepositoryError::AlreadyExists))
    }
}

/// Result of a registration attempt.
///
/// `Success` is the only variant that maps to the boolean `true` of the
/// legacy contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Success,
    AlreadyExists,
    StorageFault,
}

impl RegisterOutcome {
    pub fn is_success(self) -> bool {
        self == RegisterOutcome::Success
    }
}

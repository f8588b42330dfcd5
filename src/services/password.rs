use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use std::{fmt, str::FromStr};

/// How the `password` column is written and compared.
///
/// `Plaintext` keeps the legacy on-device behaviour: the raw string is
/// stored and compared by SQL equality. `Argon2` stores a salted PHC
/// string and verifies in process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordStorage {
    Plaintext,
    #[default]
    Argon2,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown password storage mode: {0} (expected 'plaintext' or 'argon2')")]
pub struct UnknownPasswordStorage(String);

impl FromStr for PasswordStorage {
    type Err = UnknownPasswordStorage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(PasswordStorage::Plaintext),
            "argon2" => Ok(PasswordStorage::Argon2),
            other => Err(UnknownPasswordStorage(other.to_string())),
        }
    }
}

impl fmt::Display for PasswordStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordStorage::Plaintext => write!(f, "plaintext"),
            PasswordStorage::Argon2 => write!(f, "argon2"),
        }
    }
}

impl PasswordStorage {
    /// Produce the value persisted in the `password` column.
    pub fn encode(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        match self {
            PasswordStorage::Plaintext => Ok(password.to_string()),
            PasswordStorage::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
            }
        }
    }

    /// Compare a candidate password against the persisted column value.
    pub fn matches(&self, password: &str, stored: &str) -> bool {
        match self {
            PasswordStorage::Plaintext => password == stored,
            PasswordStorage::Argon2 => {
                if let Ok(parsed_hash) = PasswordHash::new(stored) {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed_hash)
                        .is_ok()
                } else {
                    false
                }
            }
        }
    }
}

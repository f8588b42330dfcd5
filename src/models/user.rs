use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `users` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Raw password or Argon2 PHC string, depending on the store's
    /// `PasswordStorage`.
    #[serde(skip_serializing)]
    pub password: String,
}

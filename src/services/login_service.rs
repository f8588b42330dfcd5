use crate::services::credential_store::CredentialStore;
use crate::services::validation::{validate_email, validate_password, ValidationErrors};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("Incorrect email or password")]
    InvalidCredentials,
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// What a successful login hands to the next screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSession {
    pub email: String,
    pub display_name: String,
}

pub struct LoginService {
    store: Arc<CredentialStore>,
}

impl LoginService {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginSession, LoginError> {
        let email = request.email.trim();

        let mut errors = ValidationErrors::new();
        validate_email(email, &mut errors);
        validate_password(&request.password, &mut errors);
        errors.into_result().map_err(LoginError::Validation)?;

        if !self.store.verify_credentials(email, &request.password).await {
            return Err(LoginError::InvalidCredentials);
        }

        // Fall back to the email when no usable name is stored
        let display_name = self
            .store
            .lookup_name(email)
            .await
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.to_string());

        Ok(LoginSession {
            email: email.to_string(),
            display_name,
        })
    }
}

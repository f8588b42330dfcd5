use crate::error::RegisterOutcome;
use crate::services::credential_store::CredentialStore;
use crate::services::validation::{
    validate_email, validate_name, validate_password, validate_password_confirm, Field,
    ValidationErrors,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("Email already in use")]
    EmailTaken,
    #[error("Registration failed, please try again")]
    Failed,
}

impl RegistrationError {
    /// Field a form should flag for this error, if any.
    pub fn field(&self) -> Option<Field> {
        match self {
            RegistrationError::Validation(errors) => errors.first_field(),
            RegistrationError::EmailTaken => Some(Field::Email),
            RegistrationError::Failed => None,
        }
    }
}

pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

pub struct RegistrationService {
    store: Arc<CredentialStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Validate the form and register the user. Returns the email the
    /// account was stored under.
    pub async fn register(&self, request: RegisterRequest) -> Result<String, RegistrationError> {
        let name = request.name.trim();
        let email = request.email.trim();

        let mut errors = ValidationErrors::new();
        validate_name(name, &mut errors);
        validate_email(email, &mut errors);
        validate_password(&request.password, &mut errors);
        validate_password_confirm(&request.password, &request.password_confirm, &mut errors);
        errors.into_result().map_err(RegistrationError::Validation)?;

        if self.store.email_exists(email).await {
            return Err(RegistrationError::EmailTaken);
        }

        match self.store.register(name, email, &request.password).await {
            RegisterOutcome::Success => Ok(email.to_string()),
            RegisterOutcome::AlreadyExists => Err(RegistrationError::EmailTaken),
            RegisterOutcome::StorageFault => Err(RegistrationError::Failed),
        }
    }
}

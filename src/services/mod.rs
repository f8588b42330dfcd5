pub mod credential_store;
pub mod login_service;
pub mod password;
pub mod registration_service;
pub mod validation;

pub use credential_store::CredentialStore;
pub use login_service::{LoginError, LoginRequest, LoginService, LoginSession};
pub use password::PasswordStorage;
pub use registration_service::{RegisterRequest, RegistrationError, RegistrationService};

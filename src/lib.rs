pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use config::StoreConfig;
use services::{CredentialStore, LoginService, RegistrationService};

/// Everything a session needs, built once and handed to the flows.
#[derive(Clone)]
pub struct AppState {
    pub credential_store: Arc<CredentialStore>,
    pub registration_service: Arc<RegistrationService>,
    pub login_service: Arc<LoginService>,
}

impl AppState {
    pub fn new(credential_store: Arc<CredentialStore>) -> Self {
        Self {
            registration_service: Arc::new(RegistrationService::new(credential_store.clone())),
            login_service: Arc::new(LoginService::new(credential_store.clone())),
            credential_store,
        }
    }

    /// Open and initialize the store described by `config`.
    pub async fn open(config: &StoreConfig) -> error::Result<Self> {
        let store = CredentialStore::open(config).await?;
        Ok(Self::new(Arc::new(store)))
    }
}

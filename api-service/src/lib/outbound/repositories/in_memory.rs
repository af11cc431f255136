use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::account::errors::AccountError;
use crate::account::models::Credential;
use crate::account::models::CredentialId;
use crate::account::models::EmailAddress;
use crate::account::ports::CredentialStore;

/// Process-local credential store for development and tests.
///
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<CredentialId, Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Credential>, AccountError> {
        let credentials = self.credentials.read().await;
        Ok(credentials.values().find(|c| &c.email == email).cloned())
    }

    async fn find_by_id(&self, id: &CredentialId) -> Result<Option<Credential>, AccountError> {
        let credentials = self.credentials.read().await;
        Ok(credentials.get(id).cloned())
    }

    async fn create(&self, credential: Credential) -> Result<Credential, AccountError> {
        // Uniqueness check and insert happen under one write guard
        let mut credentials = self.credentials.write().await;

        if credentials.values().any(|c| c.email == credential.email) {
            return Err(AccountError::DuplicateEmail(
                credential.email.as_str().to_string(),
            ));
        }

        credentials.insert(credential.id, credential.clone());
        Ok(credential)
    }
}

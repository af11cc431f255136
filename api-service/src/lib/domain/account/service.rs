use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Identity;
use auth::SessionToken;
use chrono::Utc;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::models::Credential;
use crate::account::models::CredentialId;
use crate::account::models::LoginCommand;
use crate::account::models::Password;
use crate::account::models::RegisterCommand;
use crate::account::models::SafeProfile;
use crate::account::ports::AccountServicePort;
use crate::account::ports::CredentialStore;

/// Domain service implementation for account operations.
///
/// Orchestrates login, registration and profile lookup on top of a
/// credential store. Password hashing and verification run on the blocking
/// thread pool so they never stall the async executor.
pub struct AccountService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    /// Hash of a random secret, verified against when no credential matches
    dummy_hash: OnceCell<String>,
}

impl<CS> AccountService<CS>
where
    CS: CredentialStore,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    ///
    /// # Returns
    /// Configured account service instance
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Spend one password verification on a hash nobody knows the password
    /// for, so a miss costs about as much as a wrong password.
    async fn verify_against_dummy(&self, password: Password) -> Result<(), AccountError> {
        let dummy_hash = self
            .dummy_hash
            .get_or_try_init(|| {
                let authenticator = Arc::clone(&self.authenticator);
                async move {
                    let secret = Uuid::new_v4().to_string();
                    tokio::task::spawn_blocking(move || authenticator.hash_password(&secret))
                        .await
                        .map_err(|e| {
                            AccountError::Internal(format!("Password hashing task failed: {}", e))
                        })?
                        .map_err(|e| {
                            AccountError::Internal(format!("Password hashing failed: {}", e))
                        })
                }
            })
            .await?
            .clone();

        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || {
            let _ = authenticator.authenticate(password.expose(), &dummy_hash, "", "");
        })
        .await
        .map_err(|e| AccountError::Internal(format!("Password verification task failed: {}", e)))
    }
}

#[async_trait]
impl<CS> AccountServicePort for AccountService<CS>
where
    CS: CredentialStore,
{
    async fn login(&self, command: LoginCommand) -> Result<SessionToken, AccountError> {
        let credential = self.store.find_by_email(&command.email).await?;

        let Some((credential, stored_hash)) =
            credential.and_then(|c| c.password_hash.clone().map(|hash| (c, hash)))
        else {
            self.verify_against_dummy(command.password).await?;
            tracing::debug!("Login rejected: no usable credential for email");
            return Err(AccountError::InvalidCredentials);
        };

        let authenticator = Arc::clone(&self.authenticator);
        let subject = credential.id.to_string();
        let email = credential.email.to_string();
        let password = command.password;

        let outcome = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(password.expose(), &stored_hash, &subject, &email)
        })
        .await
        .map_err(|e| AccountError::Internal(format!("Password verification task failed: {}", e)))?;

        match outcome {
            Ok(token) => {
                tracing::info!(credential_id = %credential.id, "Login succeeded");
                Ok(token)
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::debug!(credential_id = %credential.id, "Login rejected: wrong password");
                Err(AccountError::InvalidCredentials)
            }
            Err(AuthenticationError::PasswordError(e)) => {
                tracing::warn!(
                    credential_id = %credential.id,
                    error = %e,
                    "Stored password hash could not be verified"
                );
                Err(AccountError::InvalidCredentials)
            }
            Err(AuthenticationError::JwtError(e)) => Err(AccountError::Internal(format!(
                "Token generation failed: {}",
                e
            ))),
        }
    }

    async fn register(&self, command: RegisterCommand) -> Result<SafeProfile, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;

        let password_hash =
            tokio::task::spawn_blocking(move || authenticator.hash_password(password.expose()))
                .await
                .map_err(|e| AccountError::Internal(format!("Password hashing task failed: {}", e)))?
                .map_err(|e| AccountError::Internal(format!("Password hashing failed: {}", e)))?;

        let credential = Credential {
            id: CredentialId::new(),
            email: command.email,
            password_hash: Some(password_hash),
            created_at: Utc::now(),
        };

        let created = self.store.create(credential).await?;
        tracing::info!(credential_id = %created.id, "Account registered");

        Ok(SafeProfile::from(&created))
    }

    async fn get_profile(&self, identity: &Identity) -> Result<SafeProfile, AccountError> {
        let id = CredentialId::from_string(&identity.subject)
            .map_err(|_| AccountError::NotFound(identity.subject.clone()))?;

        self.store
            .find_by_id(&id)
            .await?
            .map(|credential| SafeProfile::from(&credential))
            .ok_or(AccountError::NotFound(id.to_string()))
    }
}

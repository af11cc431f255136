use async_trait::async_trait;
use auth::Identity;
use auth::SessionToken;

use crate::account::errors::AccountError;
use crate::account::models::Credential;
use crate::account::models::CredentialId;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::SafeProfile;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Verify credentials and issue a session token.
    ///
    /// # Arguments
    /// * `command` - Validated email and password
    ///
    /// # Returns
    /// Signed session token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, no password set, or wrong password
    /// * `Store` - Credential store operation failed
    /// * `Internal` - Token signing or worker pool failure
    async fn login(&self, command: LoginCommand) -> Result<SessionToken, AccountError>;

    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated email and password
    ///
    /// # Returns
    /// Profile of the created account (never the hash)
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Store` - Credential store operation failed
    /// * `Internal` - Hashing failed
    async fn register(&self, command: RegisterCommand) -> Result<SafeProfile, AccountError>;

    /// Retrieve the profile of an authenticated caller.
    ///
    /// # Errors
    /// * `NotFound` - Account no longer exists
    /// * `Store` - Credential store operation failed
    async fn get_profile(&self, identity: &Identity) -> Result<SafeProfile, AccountError>;
}

/// Persistence operations for credentials.
///
/// Implementations must serialize conflicting writes so that two concurrent
/// `create` calls for the same email cannot both succeed.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve credential by email address.
    ///
    /// # Returns
    /// Optional credential (None if not found)
    ///
    /// # Errors
    /// * `Store` - Storage operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Credential>, AccountError>;

    /// Retrieve credential by identifier.
    ///
    /// # Returns
    /// Optional credential (None if not found)
    ///
    /// # Errors
    /// * `Store` - Storage operation failed
    async fn find_by_id(&self, id: &CredentialId) -> Result<Option<Credential>, AccountError>;

    /// Persist a new credential.
    ///
    /// # Returns
    /// Created credential
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Store` - Storage operation failed
    async fn create(&self, credential: Credential) -> Result<Credential, AccountError>;
}

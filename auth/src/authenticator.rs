use chrono::Duration;

use crate::jwt::Identity;
use crate::jwt::JwtError;
use crate::jwt::SessionToken;
use crate::jwt::TokenCodec;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Provides high-level authentication operations by coordinating
/// password hashing and session token handling. Holds no mutable state.
#[derive(Debug)]
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    token_ttl: Duration,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Default lifetime of issued session tokens.
    pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for token signing
    ///
    /// # Returns
    /// Configured Authenticator instance with default hashing cost and token TTL
    ///
    /// # Errors
    /// * `JwtError` - Signing secret is unusable
    pub fn new(jwt_secret: &[u8]) -> Result<Self, AuthenticationError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            token_codec: TokenCodec::new(jwt_secret)?,
            token_ttl: Duration::hours(Self::DEFAULT_TOKEN_TTL_HOURS),
        })
    }

    /// Replace the password hasher (e.g. one built with a custom cost).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    /// Set the lifetime of issued tokens.
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Hash a password for storage.
    ///
    /// # Arguments
    /// * `password` - Plaintext password
    ///
    /// # Returns
    /// Hashed password string
    ///
    /// # Errors
    /// * `PasswordError` - Password rejected or hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Account identifier placed in the token
    /// * `email` - Account email placed in the token
    ///
    /// # Returns
    /// Signed SessionToken valid for the configured TTL
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is malformed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        email: &str,
    ) -> Result<SessionToken, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.generate_token(subject, email)?)
    }

    /// Issue a session token without password verification.
    ///
    /// Useful when authentication has already been verified by other means.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn generate_token(&self, subject: &str, email: &str) -> Result<SessionToken, JwtError> {
        self.token_codec.issue(subject, email, self.token_ttl)
    }

    /// Validate a session token and recover its identity.
    ///
    /// # Arguments
    /// * `token` - Compact token string
    ///
    /// # Returns
    /// Identity carried by the token
    ///
    /// # Errors
    /// * `InvalidToken` - Signature or format is invalid
    /// * `TokenExpired` - Token has expired
    pub fn validate_token(&self, token: &str) -> Result<Identity, JwtError> {
        self.token_codec.verify(token)
    }
}

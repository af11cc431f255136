use std::fmt;
use std::str::FromStr;

use auth::password::MAX_PASSWORD_LENGTH;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::errors::CredentialIdError;
use crate::account::errors::EmailError;
use crate::account::errors::PasswordPolicyError;

/// Credential record as held by the credential store.
///
/// Not `Serialize`. Use [`SafeProfile`] for anything sent to a client.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: CredentialId,
    pub email: EmailAddress,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Credential unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    /// Generate a new random credential ID.
    ///
    /// # Returns
    /// CredentialId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a credential ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, CredentialIdError> {
        Uuid::parse_str(s)
            .map(CredentialId)
            .map_err(|e| CredentialIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser, trimmed and lower-cased so that
/// uniqueness is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Normalized EmailAddress value object
    ///
    /// # Errors
    /// * `Missing` - Email is empty or whitespace
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: &str) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(EmailError::Missing);
        }

        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|_| EmailError::InvalidFormat)
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfies the registration policy.
///
/// Length is counted in characters. The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 8;
    pub const MAX_LENGTH: usize = MAX_PASSWORD_LENGTH;

    /// Create a password checked against the registration policy.
    ///
    /// # Errors
    /// * `Missing` - Password is empty
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 128 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length == 0 {
            Err(PasswordPolicyError::Missing)
        } else if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    /// Login only bounds the input; policy applies at registration.
    fn for_login(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length == 0 {
            Err(PasswordPolicyError::Missing)
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Account data safe to return to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafeProfile {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Credential> for SafeProfile {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id.to_string(),
            email: credential.email.as_str().to_string(),
            created_at: credential.created_at,
        }
    }
}

/// Command to register a new account with validated fields
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: Password,
}

impl RegisterCommand {
    /// Validate raw registration input.
    ///
    /// Every field is checked; all messages are reported together in field
    /// order (email, then password).
    ///
    /// # Errors
    /// * `Validation` - One message per failing field
    pub fn new(email: Option<String>, password: Option<String>) -> Result<Self, AccountError> {
        let email = EmailAddress::new(email.as_deref().unwrap_or_default());
        let password = Password::new(password.unwrap_or_default());
        collect_fields(email, password).map(|(email, password)| Self { email, password })
    }
}

/// Command to log in with a validated email and bounded password
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: Password,
}

impl LoginCommand {
    /// Validate raw login input.
    ///
    /// # Errors
    /// * `Validation` - One message per failing field
    pub fn new(email: Option<String>, password: Option<String>) -> Result<Self, AccountError> {
        let email = EmailAddress::new(email.as_deref().unwrap_or_default());
        let password = Password::for_login(password.unwrap_or_default());
        collect_fields(email, password).map(|(email, password)| Self { email, password })
    }
}

fn collect_fields(
    email: Result<EmailAddress, EmailError>,
    password: Result<Password, PasswordPolicyError>,
) -> Result<(EmailAddress, Password), AccountError> {
    match (email, password) {
        (Ok(email), Ok(password)) => Ok((email, password)),
        (email, password) => {
            let mut messages = Vec::new();
            if let Err(e) = email {
                messages.push(e.to_string());
            }
            if let Err(e) = password {
                messages.push(e.to_string());
            }
            Err(AccountError::Validation(messages))
        }
    }
}

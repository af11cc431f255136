use thiserror::Error;

/// Error for CredentialId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email must not be empty")]
    Missing,

    #[error("email must be a valid email address")]
    InvalidFormat,
}

/// Error for password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("password must not be empty")]
    Missing,

    #[error("password must be at least {min} characters long")]
    TooShort { min: usize, actual: usize },

    #[error("password must not exceed {max} characters")]
    TooLong { max: usize, actual: usize },
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    /// Field validation failures, in field order
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Unknown email, missing hash or wrong password; callers cannot tell which
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EmailError> for AccountError {
    fn from(err: EmailError) -> Self {
        AccountError::Validation(vec![err.to_string()])
    }
}

impl From<PasswordPolicyError> for AccountError {
    fn from(err: PasswordPolicyError) -> Self {
        AccountError::Validation(vec![err.to_string()])
    }
}

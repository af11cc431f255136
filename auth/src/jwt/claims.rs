use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Claims carried by a session token.
///
/// Standard RFC 7519 claims plus the account email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (account identifier)
    pub sub: String,

    /// Account email
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

impl SessionClaims {
    /// Create claims for an account, valid for `ttl` from `issued_at`.
    ///
    /// # Arguments
    /// * `subject` - Unique account identifier
    /// * `email` - Account email
    /// * `issued_at` - Issue instant
    /// * `ttl` - Time until the token expires
    ///
    /// # Returns
    /// Claims with sub, email, iat, exp and a fresh jti set
    pub fn for_account(
        subject: impl ToString,
        email: impl ToString,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expiration = issued_at + ttl;

        Self {
            sub: subject.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token is expired at `current_timestamp`.
    ///
    /// A token is no longer valid at the instant it expires.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }
}

/// Identity recovered from a verified session token.
///
/// Attached to a request after the bearer token has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: String,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
        }
    }
}

/// A signed, self-contained session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Compact JWS (header.payload.signature)
    pub access_token: String,
    pub subject: String,
    pub email: String,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_account() {
        let now = Utc::now();
        let claims =
            SessionClaims::for_account("user123", "alice@example.com", now, Duration::hours(24));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_token_ids_are_unique() {
        let now = Utc::now();
        let first = SessionClaims::for_account("u", "u@example.com", now, Duration::hours(1));
        let second = SessionClaims::for_account("u", "u@example.com", now, Duration::hours(1));
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let mut claims = SessionClaims::for_account("u", "u@example.com", now, Duration::zero());
        claims.exp = 1000;

        assert!(!claims.is_expired(999)); // Not expired
        assert!(claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001)); // Expired
    }

    #[test]
    fn test_identity_from_claims() {
        let claims =
            SessionClaims::for_account("id-1", "a@example.com", Utc::now(), Duration::hours(1));
        let identity = Identity::from(claims);
        assert_eq!(identity.subject, "id-1");
        assert_eq!(identity.email, "a@example.com");
    }
}

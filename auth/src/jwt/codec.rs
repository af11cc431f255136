use std::collections::HashSet;
use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::SubsecRound;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Identity;
use super::claims::SessionClaims;
use super::claims::SessionToken;
use super::errors::JwtError;

/// Shortest signing secret accepted, in bytes (256 bits for HS256).
pub const MIN_SECRET_LENGTH: usize = 32;

/// Session token codec for issuing and verifying tokens.
///
/// Uses HS256 (HMAC with SHA-256). Keys are immutable once constructed, so a
/// single codec is shared by every request without locking.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenCodec {
    /// Create a new token codec with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// TokenCodec instance configured with HS256 algorithm
    ///
    /// # Errors
    /// * `WeakSecret` - Secret is shorter than `MIN_SECRET_LENGTH` bytes
    ///
    /// # Security Notes
    /// - Store secrets in environment variables or secure vaults, never in code
    /// - Rotating the secret invalidates every outstanding token
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(JwtError::WeakSecret {
                min: MIN_SECRET_LENGTH,
                actual: secret.len(),
            });
        }

        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        // Expiry is checked against an explicit clock in `verify_at`
        validation.validate_exp = false;
        validation.required_spec_claims = ["sub", "iat", "exp"]
            .into_iter()
            .map(String::from)
            .collect::<HashSet<_>>();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
        })
    }

    /// Issue a session token valid for `ttl` from now.
    ///
    /// # Arguments
    /// * `subject` - Account identifier
    /// * `email` - Account email
    /// * `ttl` - Token lifetime
    ///
    /// # Returns
    /// Signed SessionToken
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(
        &self,
        subject: impl ToString,
        email: impl ToString,
        ttl: Duration,
    ) -> Result<SessionToken, JwtError> {
        self.issue_at(subject, email, ttl, Utc::now())
    }

    /// Issue a session token as if the current time were `now`.
    ///
    /// Claims carry whole seconds, so the issue and expiry instants are
    /// truncated to the second before signing. The reported `expires_at` is
    /// exactly the instant `verify_at` starts rejecting the token.
    ///
    /// # Errors
    /// * `EncodingFailed` - `ttl` overflows the representable time range, or
    ///   signing failed
    pub fn issue_at(
        &self,
        subject: impl ToString,
        email: impl ToString,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, JwtError> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .map(|expiry| expiry.trunc_subsecs(0))
            .ok_or_else(|| {
                JwtError::EncodingFailed(format!("Token lifetime out of range: {}", ttl))
            })?;

        let claims =
            SessionClaims::for_account(subject, email, issued_at, expires_at - issued_at);
        let header = Header::new(self.algorithm);

        let access_token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

        Ok(SessionToken {
            access_token,
            subject: claims.sub,
            email: claims.email,
            token_id: claims.jti,
            issued_at,
            expires_at,
        })
    }

    /// Verify a session token against the current time.
    ///
    /// # Arguments
    /// * `token` - Compact token string
    ///
    /// # Returns
    /// Identity carried by the token
    ///
    /// # Errors
    /// * `InvalidToken` - Signature mismatch, malformed token, wrong algorithm
    ///   or missing claims
    /// * `TokenExpired` - Token expiry is at or before the current time
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a session token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, JwtError> {
        let claims = self.decode_claims(token)?;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims.into())
    }

    fn decode_claims(&self, token: &str) -> Result<SessionClaims, JwtError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for services:
//! - Password hashing (Argon2id) with a configurable cost
//! - Session token issuance and verification (HS256 JWT)
//! - Authentication coordination
//!
//! Services define their own account model and storage ports and adapt these
//! implementations. Nothing here performs I/O.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenCodec;
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let token = codec.issue("user123", "alice@example.com", Duration::hours(1)).unwrap();
//! let identity = codec.verify(&token.access_token).unwrap();
//! assert_eq!(identity.subject, "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let token = auth
//!     .authenticate("password123", &hash, "user123", "alice@example.com")
//!     .unwrap();
//!
//! // Validate token
//! let identity = auth.validate_token(&token.access_token).unwrap();
//! assert_eq!(identity.email, "alice@example.com");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Identity;
pub use jwt::JwtError;
pub use jwt::SessionClaims;
pub use jwt::SessionToken;
pub use jwt::TokenCodec;
pub use password::HashCost;
pub use password::PasswordError;
pub use password::PasswordHasher;

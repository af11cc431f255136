pub mod argon2;
pub mod errors;

pub use self::argon2::HashCost;
pub use self::argon2::PasswordHasher;
pub use self::argon2::MAX_PASSWORD_LENGTH;
pub use errors::PasswordError;

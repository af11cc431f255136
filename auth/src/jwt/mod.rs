pub mod claims;
pub mod codec;
pub mod errors;

pub use claims::Identity;
pub use claims::SessionClaims;
pub use claims::SessionToken;
pub use codec::TokenCodec;
pub use codec::MIN_SECRET_LENGTH;
pub use errors::JwtError;

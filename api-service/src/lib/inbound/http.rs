pub mod admission;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod normalizer;
pub mod router;

pub mod account;
pub mod admission;

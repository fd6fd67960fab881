//! Password storage: Argon2id PHC strings, verified in constant time.

pub mod argon2;
pub mod errors;

pub use argon2::PasswordHasher;
pub use errors::PasswordError;

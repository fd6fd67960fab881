//! Credential and session primitives for the account service.
//!
//! - Password hashing (Argon2id)
//! - Signed, expiring access and refresh tokens (JWT, HMAC)
//! - Authentication coordination (credential check, token pair issuance)
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, TokenIdentity, TokenSettings};
//!
//! let settings = TokenSettings::new("secret_key_at_least_32_bytes_long!", "HS256", 15, 10080).unwrap();
//! let auth = Authenticator::new(settings);
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue a token pair
//! let identity = TokenIdentity::new("alice@example.com", 1);
//! let pair = auth.authenticate("password123", Some(&hash), &identity, 0).unwrap();
//!
//! // Validate tokens
//! let claims = auth.verify_access(&pair.access_token).unwrap();
//! assert_eq!(claims.sub, "alice@example.com");
//! assert!(auth.verify_refresh(&pair.refresh_token).is_ok());
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod settings;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::TokenPair;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use jwt::TokenIdentity;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use settings::SettingsError;
pub use settings::TokenSettings;

pub use jsonwebtoken::Algorithm;

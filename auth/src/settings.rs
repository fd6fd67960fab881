use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Error for invalid token settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Unsupported signing algorithm: {0} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("Token lifetime for {kind} tokens must be positive, got {minutes} minutes")]
    NonPositiveLifetime { kind: &'static str, minutes: i64 },
}

/// Immutable token configuration shared by both token kinds.
///
/// Built once at startup and handed to [`crate::Authenticator::new`].
#[derive(Clone)]
pub struct TokenSettings {
    secret: Vec<u8>,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSettings {
    pub const DEFAULT_ACCESS_MINUTES: i64 = 15;
    pub const DEFAULT_REFRESH_MINUTES: i64 = 7 * 24 * 60;

    /// Validate and build token settings.
    ///
    /// # Arguments
    /// * `secret` - Shared signing secret
    /// * `algorithm` - Algorithm name, one of `HS256`, `HS384`, `HS512`
    /// * `access_minutes` - Access token lifetime
    /// * `refresh_minutes` - Refresh token lifetime
    ///
    /// # Errors
    /// * `EmptySecret` - Secret is empty
    /// * `UnsupportedAlgorithm` - Name is unknown or not a symmetric HMAC algorithm
    /// * `NonPositiveLifetime` - A lifetime is zero or negative
    pub fn new(
        secret: impl Into<Vec<u8>>,
        algorithm: &str,
        access_minutes: i64,
        refresh_minutes: i64,
    ) -> Result<Self, SettingsError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SettingsError::EmptySecret);
        }

        let algorithm = match Algorithm::from_str(algorithm.trim()) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => return Err(SettingsError::UnsupportedAlgorithm(algorithm.to_string())),
        };

        if access_minutes <= 0 {
            return Err(SettingsError::NonPositiveLifetime {
                kind: "access",
                minutes: access_minutes,
            });
        }
        if refresh_minutes <= 0 {
            return Err(SettingsError::NonPositiveLifetime {
                kind: "refresh",
                minutes: refresh_minutes,
            });
        }

        Ok(Self {
            secret,
            algorithm,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::minutes(refresh_minutes),
        })
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

use chrono::Utc;
use serde::Serialize;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenClaims;
use crate::jwt::TokenIdentity;
use crate::jwt::TokenKind;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::settings::TokenSettings;

/// Authentication coordinator combining password verification and token issuance.
///
/// Holds only immutable configuration, so one instance is shared across
/// all requests behind an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    settings: TokenSettings,
}

/// Access and refresh token issued together on login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenPair {
    pub const TOKEN_TYPE: &'static str = "bearer";
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator from validated token settings.
    pub fn new(settings: TokenSettings) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(settings.secret(), settings.algorithm()),
            settings,
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Malformed stored hashes never match.
    pub fn verify_password(&self, password: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(hash) => self.password_hasher.verify(password, hash),
            None => self.password_hasher.reject_without_hash(password),
        }
    }

    /// Verify credentials and issue a token pair.
    ///
    /// `stored_hash` is `None` when no account matched; the call still spends
    /// one hashing round and then fails with `InvalidCredentials`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - No account, or password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: Option<&str>,
        identity: &TokenIdentity,
        refresh_generation: i64,
    ) -> Result<TokenPair, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_pair(identity, refresh_generation)?)
    }

    /// Issue an access token and a refresh token for `identity`.
    ///
    /// The refresh token is bound to `refresh_generation`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue_pair(
        &self,
        identity: &TokenIdentity,
        refresh_generation: i64,
    ) -> Result<TokenPair, JwtError> {
        let now = Utc::now();

        let access_token = self.jwt_handler.issue_at(
            identity,
            TokenKind::Access,
            self.settings.access_ttl(),
            now,
            None,
        )?;
        let refresh_token = self.jwt_handler.issue_at(
            identity,
            TokenKind::Refresh,
            self.settings.refresh_ttl(),
            now,
            Some(refresh_generation),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TokenPair::TOKEN_TYPE,
        })
    }

    /// Validate an access token.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is forged, malformed, expired or a refresh token
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.jwt_handler.verify(token, TokenKind::Access)
    }

    /// Validate a refresh token.
    ///
    /// Refresh tokens without a generation claim are rejected.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is forged, malformed, expired or an access token
    pub fn verify_refresh(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let claims = self.jwt_handler.verify(token, TokenKind::Refresh)?;
        if claims.gen.is_none() {
            return Err(JwtError::InvalidToken(
                "refresh token without generation".to_string(),
            ));
        }
        Ok(claims)
    }
}

use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// The two classes of bearer token.
///
/// Both kinds share claim shape and signing key; the kind is embedded in
/// the token so each verify path can refuse the other kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Identity carried by every token: the subject email and the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub email: String,
    pub user_id: i64,
}

impl TokenIdentity {
    pub fn new(email: impl Into<String>, user_id: i64) -> Self {
        Self {
            email: email.into(),
            user_id,
        }
    }
}

/// Signed token payload.
///
/// `sub` holds the subject email and `id` the numeric user id. `gen` is
/// only present on refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject email
    pub sub: String,

    /// User identifier
    pub id: i64,

    /// Token class
    pub kind: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Refresh generation the token was issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen: Option<i64>,
}

impl TokenClaims {
    /// Build claims for `identity` issued at `now` and valid for `ttl`.
    pub fn new(
        identity: &TokenIdentity,
        kind: TokenKind,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: identity.email.clone(),
            id: identity.user_id,
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            gen: None,
        }
    }

    /// Set the refresh generation.
    pub fn with_generation(mut self, generation: i64) -> Self {
        self.gen = Some(generation);
        self
    }

    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity::new(self.sub.clone(), self.id)
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

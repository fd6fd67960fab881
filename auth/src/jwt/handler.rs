use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::claims::TokenIdentity;
use super::claims::TokenKind;
use super::errors::JwtError;

/// JWT token handler for issuing and verifying bearer tokens.
///
/// Signs with a shared symmetric secret. The handler is TTL-agnostic:
/// callers pass the lifetime for each token they issue.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `algorithm` - HMAC signing algorithm (HS256, HS384 or HS512)
    ///
    /// # Security Notes
    /// - The secret should be at least as long as the digest (32 bytes for HS256)
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
        }
    }

    /// Issue a token of `kind` for `identity`, valid for `ttl` from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(
        &self,
        identity: &TokenIdentity,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        self.issue_at(identity, kind, ttl, Utc::now(), None)
    }

    /// Issue a token with an explicit issue time and optional refresh generation.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue_at(
        &self,
        identity: &TokenIdentity,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
        generation: Option<i64>,
    ) -> Result<String, JwtError> {
        let mut claims = TokenClaims::new(identity, kind, now, ttl);
        claims.gen = generation;
        self.encode(&claims)
    }

    /// Sign already-built claims.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// Checks the signature and algorithm, the presence of `sub`, `id`,
    /// `kind` and `exp`, that the token has not expired, and that it is of
    /// the expected kind.
    ///
    /// # Errors
    /// * `InvalidToken` - Any of the checks above failed
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        if claims.kind != expected {
            return Err(JwtError::InvalidToken(format!(
                "expected {} token, got {}",
                expected, claims.kind
            )));
        }

        if claims.is_expired(Utc::now().timestamp()) {
            return Err(JwtError::InvalidToken("token expired".to_string()));
        }

        Ok(claims)
    }
}

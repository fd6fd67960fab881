use thiserror::Error;

/// Error type for JWT operations.
///
/// Every verification failure (bad signature, malformed token, missing
/// claim, wrong kind, expired) is reported as `InvalidToken`. The reason
/// string is meant for logs, not for clients.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is invalid: {0}")]
    InvalidToken(String),
}

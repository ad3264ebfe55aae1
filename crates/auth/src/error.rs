//! Authentication error types

use thiserror::Error;

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Token could not be signed
    #[error("token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    /// Token failed validation (bad signature, wrong algorithm, expired,
    /// malformed). Deliberately carries no detail.
    #[error("invalid or expired token")]
    InvalidToken,
}

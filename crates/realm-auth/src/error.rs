//! Authentication collaborator error types.

use thiserror::Error;

/// Errors raised by the password hasher and session store.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Hashing algorithm is not supported.
    #[error("unsupported hashing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Stored digest could not be parsed.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// Hashing failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Session store write failed.
    #[error("session store error: {0}")]
    Session(String),
}

impl AuthError {
    /// Checks if this error concerns a stored digest rather than the hasher itself.
    #[must_use]
    pub const fn is_malformed_hash(&self) -> bool {
        matches!(self, Self::MalformedHash(_))
    }

    /// Checks if a stored digest could not be interpreted at all, either
    /// because it is malformed or because its scheme is unknown.
    #[must_use]
    pub const fn is_unreadable_digest(&self) -> bool {
        matches!(self, Self::MalformedHash(_) | Self::UnsupportedAlgorithm(_))
    }
}

/// Result type for authentication collaborator operations.
pub type AuthResult<T> = Result<T, AuthError>;

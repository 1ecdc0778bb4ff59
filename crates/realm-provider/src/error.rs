//! Provider error types.
//!
//! "Not found" is never an error here: lookups that miss return `Ok(None)`
//! or `Ok(false)`, so callers can tell bad input from a missing record.

use realm_auth::AuthError;
use realm_model::ModelError;
use realm_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Caller supplied insufficient input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Realm is misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Underlying data access failed.
    #[error("Store error: {0}")]
    Store(#[from] StorageError),

    /// Password hashing or session store failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl ProviderError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Checks if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Checks if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Checks if this error came from the store.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<ModelError> for ProviderError {
    fn from(err: ModelError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<realm_core::Error> for ProviderError {
    fn from(err: realm_core::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

//! Storage error types.

use thiserror::Error;

/// Errors that can occur during schema operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity (resultset) is not known to the schema.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Constraint violation (unique key, foreign key).
    #[error("Constraint violation on {entity}: {message}")]
    Constraint {
        /// Entity the write was aimed at.
        entity: String,
        /// Description of the violated constraint.
        message: String,
    },

    /// Invalid data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Creates an unknown entity error.
    #[must_use]
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        Self::UnknownEntity(entity.into())
    }

    /// Creates a constraint violation error.
    #[must_use]
    pub fn constraint(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Checks if this is an unknown entity error.
    #[must_use]
    pub const fn is_unknown_entity(&self) -> bool {
        matches!(self, Self::UnknownEntity(_))
    }

    /// Checks if this is a constraint violation.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

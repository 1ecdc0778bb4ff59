//! Model error types.

use thiserror::Error;

/// Errors raised while building model values from settings.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Filter operator is not supported.
    #[error("unsupported operator '{operator}' on column '{column}'")]
    UnknownOperator {
        /// Column the condition applies to.
        column: String,
        /// Offending operator.
        operator: String,
    },

    /// Operand has the wrong shape for its operator.
    #[error("invalid condition on column '{column}': {reason}")]
    InvalidOperand {
        /// Column the condition applies to.
        column: String,
        /// What was wrong.
        reason: &'static str,
    },
}

impl ModelError {
    /// Creates an invalid operand error.
    #[must_use]
    pub fn invalid_operand(column: &str, reason: &'static str) -> Self {
        Self::InvalidOperand {
            column: column.to_string(),
            reason,
        }
    }
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

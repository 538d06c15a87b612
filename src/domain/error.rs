//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of feature model invariants.
/// Every variant reflects a caller precondition or a used-up identifier chain;
/// none is transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid identifier {input:?}: {reason}")]
    Format { input: String, reason: String },

    #[error("structural violation: {0}")]
    Structural(String),

    #[error("unknown reference in formula: {0}")]
    UnknownReference(String),

    #[error("already registered: {0}")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("identifier chain exhausted: {0}")]
    Exhausted(String),
}

impl DomainError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    pub(crate) fn check_index(index: usize, len: usize) -> DomainResult<()> {
        if index > len {
            return Err(Self::OutOfBounds { index, len });
        }
        Ok(())
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

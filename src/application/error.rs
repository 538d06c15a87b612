//! Application-level errors (wraps domain errors)

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add format and configuration failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("model cannot be written: {reason}")]
    NotRepresentable { reason: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Wraps a failed model file access, naming the action and the path.
    pub(crate) fn file(action: &str, path: &Path, source: io::Error) -> Self {
        Self::OperationFailed {
            context: format!("{} {}", action, path.display()),
            source: Box::new(source),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

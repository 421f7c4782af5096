//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// The backing store could not be reached or rejected the command
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// A stored value could not be decoded
    #[error("Corrupt directory record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl DomainError {
    /// Get an error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable(_) => "DIRECTORY_UNAVAILABLE",
            Self::CorruptRecord { .. } => "CORRUPT_RECORD",
        }
    }
}

//! Repository error types.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Lock was poisoned (thread panicked while holding lock)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// No character stored under this id
    #[error("Character not found: {0}")]
    NotFound(String),

    /// Character id cannot be used as a storage key
    #[error("Invalid character id: {0:?}")]
    InvalidId(String),

    /// I/O error (for file-based repositories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

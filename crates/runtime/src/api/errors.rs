//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from repositories, content loading and the resolver so
//! clients can bubble them up with consistent context.
use thiserror::Error;

use rules_core::{ErrorSeverity, ResolveError, RulesError, SelectionError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("failed to load content")]
    Content(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("runtime requires a content provider before building")]
    MissingProvider,

    #[error("runtime requires a character repository before building")]
    MissingRepository,

    #[error("resolver task join failed")]
    ResolverJoin(#[source] tokio::task::JoinError),

    #[error("resolver pool closed")]
    PoolClosed,
}

impl RuntimeError {
    /// Severity of the underlying failure, for hosts that triage errors.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Resolve(err) => err.severity(),
            Self::Selection(err) => err.severity(),
            Self::Repository(RepositoryError::NotFound(_) | RepositoryError::InvalidId(_)) => {
                ErrorSeverity::Validation
            }
            Self::MissingProvider | Self::MissingRepository => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repository(err) if err.is_not_found())
    }
}

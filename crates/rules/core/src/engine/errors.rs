//! Error types for the resolution pipeline.

use crate::content::{ContentRef, ProviderError};
use crate::error::{ErrorSeverity, RulesError};
use crate::variable::StoreError;

/// Identifies which stage of a pass produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResolvePhase {
    Seed,
    Expand,
    Apply,
    Finalize,
}

/// Structural failures that abort a resolution pass.
///
/// Everything recoverable is recorded in the report instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("character {character} exceeded the limit of {limit} operations")]
    OperationLimitExceeded { character: String, limit: usize },

    #[error("nesting under {entity} exceeds the depth limit of {limit}")]
    GrantDepthExceeded { entity: ContentRef, limit: usize },

    #[error("{phase} failed: {source}")]
    Provider {
        phase: ResolvePhase,
        #[source]
        source: ProviderError,
    },

    #[error("{phase} failed: {source}")]
    Store {
        phase: ResolvePhase,
        #[source]
        source: StoreError,
    },
}

impl ResolveError {
    pub(crate) fn provider(phase: ResolvePhase, source: ProviderError) -> Self {
        Self::Provider { phase, source }
    }

    pub(crate) fn store(phase: ResolvePhase, source: StoreError) -> Self {
        Self::Store { phase, source }
    }
}

impl RulesError for ResolveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Store { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::OperationLimitExceeded { .. } => "operation_limit_exceeded",
            Self::GrantDepthExceeded { .. } => "grant_depth_exceeded",
            Self::Provider { source, .. } => source.error_code(),
            Self::Store { source, .. } => source.error_code(),
        }
    }
}

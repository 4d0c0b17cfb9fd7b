//! Common error infrastructure for rules-core.
//!
//! Domain-specific errors (`StoreError`, `ResolveError`, `SelectionError`,
//! `ProviderError`) live next to the component that raises them. They all
//! implement [`RulesError`] so callers can classify failures uniformly.
//!
//! Most conditions met during a resolution pass are *not* errors: pending
//! selections, stale selections, type mismatches and cyclic grants are
//! accumulated into the [`ResolutionReport`](crate::engine::ResolutionReport)
//! and the pass continues. The types here cover the failures that do
//! propagate through `Result`.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorSeverity {
    /// The caller can retry, possibly after the player acts.
    ///
    /// Examples: selection awaiting input, variable not yet defined
    Recoverable,

    /// Invalid input, should not retry without changes.
    ///
    /// Examples: option id not offered by a select, bonus on a string variable
    Validation,

    /// Unexpected inconsistency in authored content.
    ///
    /// Examples: grant chain revisiting its own entity
    Internal,

    /// The resolution pass cannot produce a store.
    ///
    /// Examples: operation budget exhausted, content provider failure
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates broken content or a broken pass.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all rules-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Return a stable snake_case code from `error_code`
pub trait RulesError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classification() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_recoverable());
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert_eq!(ErrorSeverity::Fatal.as_str(), "fatal");
    }
}

//! Selection resolver: player choices for `select` operations.
//!
//! Choices are persisted in [`OperationData::selections`] keyed by the
//! `select` operation's id. Recording a choice validates it against the
//! current resolution, writes it, and re-resolves immediately so the caller
//! always holds a store consistent with the stored choices.
//!
//! [`OperationData::selections`]: crate::character::OperationData::selections

use thiserror::Error;

use crate::character::Character;
use crate::content::ContentProvider;
use crate::engine::{Resolution, ResolveError, Resolver};
use crate::error::{ErrorSeverity, RulesError};
use crate::operation::{Operation, OperationId};

/// Errors raised when recording a selection.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("operation {0} is not a select reached by this character")]
    NotASelection(OperationId),

    #[error("select {operation} offers no option {option}")]
    UnknownOption {
        operation: OperationId,
        option: OperationId,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl RulesError for SelectionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotASelection(_) | Self::UnknownOption { .. } => ErrorSeverity::Validation,
            Self::Resolve(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotASelection(_) => "not_a_selection",
            Self::UnknownOption { .. } => "unknown_option",
            Self::Resolve(err) => err.error_code(),
        }
    }
}

/// `select` operations of `resolution` still awaiting a choice, in the
/// order the pass reached them.
pub fn list_pending_selections(resolution: &Resolution) -> Vec<Operation> {
    resolution.pending_selections().cloned().collect()
}

/// Checks that `operation` is a `select` reached in `resolution` and that it
/// offers `option`.
pub fn validate_selection(
    resolution: &Resolution,
    operation: OperationId,
    option: OperationId,
) -> Result<(), SelectionError> {
    let select = resolution
        .selection_point(operation)
        .and_then(|point| point.operation.as_select())
        .ok_or(SelectionError::NotASelection(operation))?;

    if select.option(option).is_none() {
        return Err(SelectionError::UnknownOption { operation, option });
    }
    Ok(())
}

/// Binds a resolver to a content provider for selection workflows.
pub struct SelectionResolver<'a> {
    resolver: &'a Resolver,
    provider: &'a dyn ContentProvider,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(resolver: &'a Resolver, provider: &'a dyn ContentProvider) -> Self {
        Self { resolver, provider }
    }

    pub fn resolve(&self, character: &Character) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(character, self.provider)
    }

    /// Resolves `character` and lists the selections it still needs.
    pub fn pending(&self, character: &Character) -> Result<Vec<Operation>, ResolveError> {
        self.resolve(character)
            .map(|resolution| list_pending_selections(&resolution))
    }

    /// Records `option` for `operation` and returns the re-resolved state.
    ///
    /// The character is left untouched when validation fails.
    pub fn record(
        &self,
        character: &mut Character,
        operation: OperationId,
        option: OperationId,
    ) -> Result<Resolution, SelectionError> {
        let current = self.resolve(character)?;
        validate_selection(&current, operation, option)?;

        character
            .operation_data
            .record_selection(operation, option);
        tracing::debug!(character = %character.id, %operation, %option, "selection recorded");
        Ok(self.resolve(character)?)
    }

    /// Removes the stored choice for `operation` and returns the re-resolved
    /// state. Clearing an absent choice is not an error.
    pub fn clear(
        &self,
        character: &mut Character,
        operation: OperationId,
    ) -> Result<Resolution, ResolveError> {
        if character.operation_data.clear_selection(operation) {
            tracing::debug!(character = %character.id, %operation, "selection cleared");
        }
        self.resolve(character)
    }
}

/// Attaches a note to an operation. Notes do not affect resolution.
pub fn set_note(character: &mut Character, operation: OperationId, text: impl Into<String>) {
    character.operation_data.set_note(operation, text);
}

pub fn clear_note(character: &mut Character, operation: OperationId) -> bool {
    character.operation_data.clear_note(operation)
}

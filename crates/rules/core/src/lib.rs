//! Deterministic rules resolution for tabletop character sheets.
//!
//! `rules-core` folds the operations attached to a character's content
//! (ancestry, background, class, feats, items, conditions) into a typed
//! [`VariableStore`]. Resolution is a pure function of content, stored
//! selections and custom operations; every pass starts from an empty store.
//! Content is read through the [`ContentProvider`] seam, and all resolution
//! flows through [`engine::Resolver`].
pub mod character;
pub mod conditional;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod operation;
pub mod selection;
pub mod variable;

#[cfg(test)]
pub(crate) mod testing;

pub use character::{Character, ItemSlot, OperationData};
pub use conditional::{AdvisoryModifier, Applicability};
pub use config::{ConditionalPolicy, PenaltyStacking, ResolverConfig};
pub use content::{ClassFeature, ContentKind, ContentProvider, ContentRef, ProviderError};
pub use engine::{
    Issue, IssueKind, OperationRecord, ResolutionReport, Resolution, ResolveError, ResolvePhase,
    Resolver, SelectionPoint, SelectionState,
};
pub use error::{ErrorSeverity, RulesError};
pub use operation::{
    AddBonusToValue, Comparison, Conditional, GiveLanguage, GiveSpell, GiveTrait, Grant,
    Operation, OperationId, OperationKind, OperationTag, Predicate, Select, SelectOption,
    SendNotification, ValueChange,
};
pub use selection::{SelectionError, SelectionResolver, list_pending_selections, validate_selection};
pub use variable::{
    AttributeValue, BonusEntry, BonusStack, BonusType, CHARACTER_SCOPE, ScopeView, StoreError,
    Variable, VariableStore, VariableType, VariableValue,
};

//! Scoped, typed variable store.
//!
//! The store is a projection: it is rebuilt from scratch on every resolution
//! pass and never edited by hand. Each character owns its own store, so two
//! characters' variables never interact. Within a store, variables live in
//! named scopes (the resolver writes to [`CHARACTER_SCOPE`]).
//!
//! Tables are `BTreeMap`s so iteration and serialized output are stable.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{BonusEntry, StackingRules, Variable, VariableType, VariableValue};
use crate::conditional::AdvisoryModifier;
use crate::error::{ErrorSeverity, RulesError};

/// Scope written by the resolution pipeline.
pub const CHARACTER_SCOPE: &str = "CHARACTER";

/// Errors raised by variable store mutations and strict lookups.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("variable {scope}.{variable} is {expected}, got {found}")]
    TypeMismatch {
        scope: String,
        variable: String,
        expected: VariableType,
        found: VariableType,
    },

    #[error("variable {scope}.{variable} is not defined")]
    NotFound { scope: String, variable: String },
}

impl RulesError for StoreError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TypeMismatch { .. } => ErrorSeverity::Validation,
            Self::NotFound { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::NotFound { .. } => "not_found",
        }
    }
}

type Table = BTreeMap<String, Variable>;

/// Per-character variable table, partitioned by scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableStore {
    rules: StackingRules,
    scopes: BTreeMap<String, Table>,
}

impl VariableStore {
    pub fn new(rules: StackingRules) -> Self {
        Self {
            rules,
            scopes: BTreeMap::new(),
        }
    }

    pub fn rules(&self) -> &StackingRules {
        &self.rules
    }

    /// Looks up a variable. Absence is a normal outcome, not an error.
    pub fn get(&self, scope: &str, name: &str) -> Option<&Variable> {
        self.scopes.get(scope)?.get(name)
    }

    /// Looks up a variable, reporting absence as [`StoreError::NotFound`].
    pub fn require(&self, scope: &str, name: &str) -> Result<&Variable, StoreError> {
        self.get(scope, name).ok_or_else(|| StoreError::NotFound {
            scope: scope.to_string(),
            variable: name.to_string(),
        })
    }

    /// Read-only handle onto one scope.
    pub fn scope<'a>(&'a self, scope: &'a str) -> ScopeView<'a> {
        ScopeView {
            name: scope,
            table: self.scopes.get(scope),
        }
    }

    /// Declares a variable. Redeclaring with the same type keeps the current
    /// value; redeclaring with another type fails.
    pub fn declare(
        &mut self,
        scope: &str,
        name: &str,
        initial: VariableValue,
    ) -> Result<&Variable, StoreError> {
        let table = self.scopes.entry(scope.to_string()).or_default();
        if let Some(existing) = table.get(name) {
            check_type(scope, existing, initial.var_type())?;
        }
        Ok(table
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name, initial)))
    }

    /// Overwrites the base value, creating the variable when absent.
    pub fn set(&mut self, scope: &str, name: &str, value: VariableValue) -> Result<(), StoreError> {
        let rules = self.rules;
        let variable = self.entry(scope, name, value.var_type());
        check_type(scope, variable, value.var_type())?;
        variable.set_base(value, &rules);
        Ok(())
    }

    /// Adjusts the base value (add, boost, append, OR, overwrite by type).
    ///
    /// Creates the variable from the adjustment's own type when absent.
    pub fn adjust(
        &mut self,
        scope: &str,
        name: &str,
        by: &VariableValue,
    ) -> Result<(), StoreError> {
        let rules = self.rules;
        let variable = self.entry(scope, name, by.var_type());
        let adjusted = variable
            .base()
            .adjusted(by)
            .ok_or_else(|| StoreError::TypeMismatch {
                scope: scope.to_string(),
                variable: name.to_string(),
                expected: variable.var_type(),
                found: by.var_type(),
            })?;
        variable.set_base(adjusted, &rules);
        Ok(())
    }

    /// Removes an element from a list variable. Absent variables are left absent.
    pub fn remove_item(
        &mut self,
        scope: &str,
        name: &str,
        item: &VariableValue,
    ) -> Result<(), StoreError> {
        let rules = self.rules;
        let Some(variable) = self.scopes.get_mut(scope).and_then(|t| t.get_mut(name)) else {
            return Ok(());
        };
        let remaining = variable
            .base()
            .without(item)
            .ok_or_else(|| StoreError::TypeMismatch {
                scope: scope.to_string(),
                variable: name.to_string(),
                expected: variable.var_type(),
                found: item.var_type(),
            })?;
        variable.set_base(remaining, &rules);
        Ok(())
    }

    /// Appends a stacking entry and recomputes the value.
    ///
    /// An absent target is created as a numeric variable with base 0.
    pub fn add_bonus(
        &mut self,
        scope: &str,
        name: &str,
        entry: BonusEntry,
    ) -> Result<(), StoreError> {
        let rules = self.rules;
        let variable = self.entry(scope, name, VariableType::Numeric);
        if !variable.var_type().accepts_bonuses() {
            return Err(StoreError::TypeMismatch {
                scope: scope.to_string(),
                variable: name.to_string(),
                expected: variable.var_type(),
                found: VariableType::Numeric,
            });
        }
        variable.push_bonus(entry, &rules);
        Ok(())
    }

    /// Clears every variable of a scope.
    pub fn reset(&mut self, scope: &str) {
        self.scopes.remove(scope);
    }

    /// All bonus entries not folded into their variable, in store order.
    pub fn advisories(&self) -> Vec<AdvisoryModifier> {
        self.scopes
            .iter()
            .flat_map(|(scope, table)| {
                table.values().flat_map(move |variable| {
                    variable
                        .bonuses()
                        .advisory(&self.rules)
                        .filter_map(move |entry| {
                            AdvisoryModifier::from_entry(scope, variable.name(), entry)
                        })
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&mut self, scope: &str, name: &str, var_type: VariableType) -> &mut Variable {
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert_with(|| Variable::declare(name, var_type))
    }
}

fn check_type(scope: &str, variable: &Variable, found: VariableType) -> Result<(), StoreError> {
    if variable.var_type() == found {
        Ok(())
    } else {
        Err(StoreError::TypeMismatch {
            scope: scope.to_string(),
            variable: variable.name().to_string(),
            expected: variable.var_type(),
            found,
        })
    }
}

/// Read-only handle onto one scope of a [`VariableStore`].
///
/// Predicates and consumers receive this instead of the store itself.
#[derive(Clone, Copy, Debug)]
pub struct ScopeView<'a> {
    name: &'a str,
    table: Option<&'a Table>,
}

impl<'a> ScopeView<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn get(&self, variable: &str) -> Option<&'a Variable> {
        self.table?.get(variable)
    }

    /// Resolved value of a variable, if defined.
    pub fn value(&self, variable: &str) -> Option<&'a VariableValue> {
        self.get(variable).map(Variable::value)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.get(variable).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Variable> + 'a {
        self.table.into_iter().flat_map(|t| t.values())
    }

    pub fn len(&self) -> usize {
        self.table.map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

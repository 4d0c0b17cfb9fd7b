//! Conditional text evaluation.
//!
//! Bonuses authored with conditional text ("+2 vs. undead", "while raging")
//! describe situations the variable store cannot observe. Such entries are
//! recorded on their variable but are not folded into its value; instead
//! they are surfaced as [`AdvisoryModifier`]s the player invokes at the table.
//!
//! With [`ConditionalPolicy::HonorAutoApply`] an author can opt a single
//! conditional bonus into automatic application through its `auto_apply`
//! flag. Entries without text are always applied.

use crate::config::ConditionalPolicy;
use crate::content::ContentRef;
use crate::operation::OperationId;
use crate::variable::{BonusEntry, BonusType};

/// Whether a bonus entry contributes to its variable's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Applicability {
    /// Folded into the variable's value.
    Applied,
    /// Shown to the player, invoked manually.
    Advisory,
}

/// Decides whether `entry` is folded into its variable under `policy`.
pub fn applicability(entry: &BonusEntry, policy: ConditionalPolicy) -> Applicability {
    if entry.condition().is_none() {
        return Applicability::Applied;
    }
    match policy {
        ConditionalPolicy::HonorAutoApply if entry.auto_apply => Applicability::Applied,
        _ => Applicability::Advisory,
    }
}

/// A situational bonus available to the player but not part of any total.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvisoryModifier {
    pub scope: String,
    pub variable: String,
    pub amount: i64,
    pub bonus_type: BonusType,
    pub text: String,
    pub source: Option<ContentRef>,
    pub operation: Option<OperationId>,
}

impl AdvisoryModifier {
    /// Builds the advisory view of an entry, or `None` if it has no condition.
    pub fn from_entry(scope: &str, variable: &str, entry: &BonusEntry) -> Option<Self> {
        let text = entry.condition()?;
        Some(Self {
            scope: scope.to_string(),
            variable: variable.to_string(),
            amount: entry.amount,
            bonus_type: entry.bonus_type.clone(),
            text: text.to_string(),
            source: entry.source.clone(),
            operation: entry.operation,
        })
    }
}

impl core::fmt::Display for AdvisoryModifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:+} {} to {} ({})",
            self.amount, self.bonus_type, self.variable, self.text
        )
    }
}

//! Bonus stacking algebra.
//!
//! Every bonus targeting a variable is recorded as a [`BonusEntry`]. The
//! variable's resolved value is its base plus the contribution of the
//! [`BonusStack`]:
//!
//! 1. Entries that are advisory (conditional text, see [`crate::conditional`])
//!    are skipped
//! 2. Untyped entries are summed
//! 3. Typed entries are grouped by type; each group contributes only its
//!    winning amount
//! 4. Group winners and the untyped sum are added
//!
//! The contribution is independent of entry order: within a type the winner
//! is chosen by magnitude, never by which source came first.

use std::collections::BTreeMap;

use crate::conditional::{self, Applicability};
use crate::config::{ConditionalPolicy, PenaltyStacking, ResolverConfig};
use crate::content::ContentRef;
use crate::operation::OperationId;

/// Label grouping bonuses that do not stack with each other.
///
/// Labels are normalised (trimmed, lowercased). An empty label or the label
/// `untyped` yields [`BonusType::Untyped`], which always stacks.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BonusType {
    Untyped,
    Typed(String),
}

impl BonusType {
    pub const UNTYPED_LABEL: &'static str = "untyped";

    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") => Self::Untyped,
            Some(l) if l.eq_ignore_ascii_case(Self::UNTYPED_LABEL) => Self::Untyped,
            Some(l) => Self::Typed(l.to_ascii_lowercase()),
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Self::Untyped)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Untyped => Self::UNTYPED_LABEL,
            Self::Typed(label) => label,
        }
    }
}

impl core::fmt::Display for BonusType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// One stacking contribution to a numeric or attribute variable.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusEntry {
    pub amount: i64,
    pub bonus_type: BonusType,
    /// Content entity that contributed the bonus.
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<ContentRef>,
    /// Operation that produced the bonus.
    #[cfg_attr(feature = "serde", serde(default))]
    pub operation: Option<OperationId>,
    /// Situational condition, e.g. "vs. undead". Non-empty text makes the
    /// entry advisory under the default policy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditional_text: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_apply: bool,
}

impl BonusEntry {
    pub fn new(amount: i64, bonus_type: BonusType) -> Self {
        Self {
            amount,
            bonus_type,
            source: None,
            operation: None,
            conditional_text: None,
            auto_apply: false,
        }
    }

    /// Untyped bonus.
    pub fn untyped(amount: i64) -> Self {
        Self::new(amount, BonusType::Untyped)
    }

    /// Bonus with a type label (`"item"`, `"status"`, ...).
    pub fn typed(amount: i64, label: &str) -> Self {
        Self::new(amount, BonusType::from_label(Some(label)))
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.conditional_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: ContentRef) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: OperationId) -> Self {
        self.operation = Some(operation);
        self
    }

    #[must_use]
    pub fn auto_applied(mut self) -> Self {
        self.auto_apply = true;
        self
    }

    /// Non-empty conditional text.
    pub fn condition(&self) -> Option<&str> {
        self.conditional_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// The subset of resolver configuration the stacking algebra needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackingRules {
    pub conditional_policy: ConditionalPolicy,
    pub penalty_stacking: PenaltyStacking,
}

impl From<&ResolverConfig> for StackingRules {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            conditional_policy: config.conditional_policy,
            penalty_stacking: config.penalty_stacking,
        }
    }
}

/// Per-type view of a stack, in type order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BonusBreakdown {
    /// Sum of untyped applied entries.
    pub untyped: i64,
    /// Winning contribution of each typed group.
    pub typed: BTreeMap<BonusType, i64>,
}

impl BonusBreakdown {
    pub fn total(&self) -> i64 {
        self.typed
            .values()
            .fold(self.untyped, |total, amount| total.saturating_add(*amount))
    }
}

/// Ordered collection of bonus entries on one variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BonusStack {
    entries: Vec<BonusEntry>,
}

impl BonusStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, entry: BonusEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = BonusEntry>) {
        self.entries.extend(entries);
    }

    /// All entries in application order.
    pub fn entries(&self) -> &[BonusEntry] {
        &self.entries
    }

    /// Entries folded into the value.
    pub fn applied<'a>(
        &'a self,
        rules: &'a StackingRules,
    ) -> impl Iterator<Item = &'a BonusEntry> + 'a {
        self.entries.iter().filter(move |e| {
            conditional::applicability(e, rules.conditional_policy) == Applicability::Applied
        })
    }

    /// Entries surfaced to the player but not folded into the value.
    pub fn advisory<'a>(
        &'a self,
        rules: &'a StackingRules,
    ) -> impl Iterator<Item = &'a BonusEntry> + 'a {
        self.entries.iter().filter(move |e| {
            conditional::applicability(e, rules.conditional_policy) == Applicability::Advisory
        })
    }

    /// Computes the per-type contribution of the applied entries.
    pub fn breakdown(&self, rules: &StackingRules) -> BonusBreakdown {
        let mut untyped: i64 = 0;
        // (largest, most negative) per type
        let mut groups: BTreeMap<BonusType, (Option<i64>, Option<i64>)> = BTreeMap::new();

        for entry in self.applied(rules) {
            if entry.bonus_type.is_untyped() {
                untyped = untyped.saturating_add(entry.amount);
                continue;
            }
            let (largest, lowest) = groups.entry(entry.bonus_type.clone()).or_default();
            *largest = Some(largest.map_or(entry.amount, |m| m.max(entry.amount)));
            *lowest = Some(lowest.map_or(entry.amount, |m| m.min(entry.amount)));
        }

        let typed = groups
            .into_iter()
            .map(|(bonus_type, (largest, lowest))| {
                let largest = largest.unwrap_or_default();
                let lowest = lowest.unwrap_or_default();
                let contribution = match rules.penalty_stacking {
                    PenaltyStacking::LargestSigned => largest,
                    PenaltyStacking::SeparatePenalties => largest.max(0) + lowest.min(0),
                };
                (bonus_type, contribution)
            })
            .collect();

        BonusBreakdown { untyped, typed }
    }

    /// Total amount the stack adds to the base value.
    pub fn contribution(&self, rules: &StackingRules) -> i64 {
        self.breakdown(rules).total()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

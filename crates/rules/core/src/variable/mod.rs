//! Typed variables - the slots of a character's derived state.
//!
//! A [`Variable`] pairs a declared [`VariableType`] with a base value and an
//! ordered list of stacking bonuses. The resolved value is recomputed every
//! time the base or the bonus list changes:
//!
//! ```text
//! value = base + Σ(max amount per bonus type) + Σ(untyped amounts)
//! ```
//!
//! Only numeric and attribute variables accept bonuses. A variable's type is
//! fixed at creation; writes with a value of another type fail with
//! [`StoreError::TypeMismatch`] and leave the variable untouched.

pub mod bonus;
pub mod defaults;
pub mod store;

pub use bonus::{BonusBreakdown, BonusEntry, BonusStack, BonusType, StackingRules};
pub use defaults::{finalize_derived, seed_character_scope};
pub use store::{CHARACTER_SCOPE, ScopeView, StoreError, VariableStore};

/// Declared type of a variable.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum VariableType {
    Numeric,
    Boolean,
    String,
    ListOfString,
    ListOfNumeric,
    Attribute,
}

impl VariableType {
    /// Returns true if stacking bonuses can target this type.
    pub const fn accepts_bonuses(&self) -> bool {
        matches!(self, Self::Numeric | Self::Attribute)
    }

    /// The value a freshly declared variable of this type holds.
    pub fn zero(&self) -> VariableValue {
        match self {
            Self::Numeric => VariableValue::Numeric(0),
            Self::Boolean => VariableValue::Boolean(false),
            Self::String => VariableValue::String(String::new()),
            Self::ListOfString => VariableValue::ListOfString(Vec::new()),
            Self::ListOfNumeric => VariableValue::ListOfNumeric(Vec::new()),
            Self::Attribute => VariableValue::Attribute(AttributeValue::default()),
        }
    }
}

/// Ability modifier with a pending partial boost.
///
/// Boosting an attribute that is already at [`AttributeValue::PARTIAL_THRESHOLD`]
/// or above only marks it `partial`; the next boost completes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeValue {
    pub value: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub partial: bool,
}

impl AttributeValue {
    pub const PARTIAL_THRESHOLD: i64 = 4;

    pub const fn new(value: i64) -> Self {
        Self {
            value,
            partial: false,
        }
    }

    /// Applies `steps` boosts (positive) or flaws (negative).
    ///
    /// Boosts below the threshold add one each; from the threshold on,
    /// every two boosts add one. Arithmetic saturates at the `i64` bounds.
    pub fn adjust(mut self, steps: i64) -> Self {
        if steps < 0 {
            self.value = self.value.saturating_add(steps);
            return self;
        }

        let below = Self::PARTIAL_THRESHOLD.saturating_sub(self.value).clamp(0, steps);
        self.value += below;
        let remaining = steps - below;
        if remaining == 0 {
            return self;
        }

        let mut full = remaining / 2;
        let odd = remaining % 2 == 1;
        match (self.partial, odd) {
            (true, true) => {
                full += 1;
                self.partial = false;
            }
            (false, true) => self.partial = true,
            (_, false) => {}
        }
        self.value = self.value.saturating_add(full);
        self
    }
}

/// Runtime value of a variable, tagged by type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum VariableValue {
    Numeric(i64),
    Boolean(bool),
    String(String),
    ListOfString(Vec<String>),
    ListOfNumeric(Vec<i64>),
    Attribute(AttributeValue),
}

impl VariableValue {
    pub fn var_type(&self) -> VariableType {
        match self {
            Self::Numeric(_) => VariableType::Numeric,
            Self::Boolean(_) => VariableType::Boolean,
            Self::String(_) => VariableType::String,
            Self::ListOfString(_) => VariableType::ListOfString,
            Self::ListOfNumeric(_) => VariableType::ListOfNumeric,
            Self::Attribute(_) => VariableType::Attribute,
        }
    }

    /// Numeric view used by comparisons: numeric values and attribute modifiers.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Attribute(attr) => Some(attr.value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns true if `item` is an element of this list value.
    pub fn contains(&self, item: &VariableValue) -> bool {
        match (self, item) {
            (Self::ListOfString(list), Self::String(s)) => list.contains(s),
            (Self::ListOfNumeric(list), Self::Numeric(n)) => list.contains(n),
            _ => false,
        }
    }

    /// Adds a bonus contribution to a numeric or attribute value.
    pub(crate) fn plus(&self, amount: i64) -> Self {
        match self {
            Self::Numeric(n) => Self::Numeric(n.saturating_add(amount)),
            Self::Attribute(attr) => Self::Attribute(AttributeValue {
                value: attr.value.saturating_add(amount),
                partial: attr.partial,
            }),
            other => other.clone(),
        }
    }

    /// Combines an adjustment into this value, or returns `None` when the
    /// adjustment's type cannot apply to this value's type.
    ///
    /// - numeric: add
    /// - attribute: boost/flaw by a numeric step count
    /// - boolean: logical OR
    /// - string: overwrite
    /// - lists: append the element(s) not already present
    pub(crate) fn adjusted(&self, by: &VariableValue) -> Option<Self> {
        match (self, by) {
            (Self::Numeric(n), Self::Numeric(d)) => Some(Self::Numeric(n.saturating_add(*d))),
            (Self::Attribute(attr), Self::Numeric(d)) => Some(Self::Attribute(attr.adjust(*d))),
            (Self::Boolean(b), Self::Boolean(d)) => Some(Self::Boolean(*b || *d)),
            (Self::String(_), Self::String(s)) => Some(Self::String(s.clone())),
            (Self::ListOfString(list), Self::String(s)) => {
                Some(Self::ListOfString(append_unique(list, std::slice::from_ref(s))))
            }
            (Self::ListOfString(list), Self::ListOfString(items)) => {
                Some(Self::ListOfString(append_unique(list, items)))
            }
            (Self::ListOfNumeric(list), Self::Numeric(n)) => {
                Some(Self::ListOfNumeric(append_unique(list, std::slice::from_ref(n))))
            }
            (Self::ListOfNumeric(list), Self::ListOfNumeric(items)) => {
                Some(Self::ListOfNumeric(append_unique(list, items)))
            }
            _ => None,
        }
    }

    /// Removes an element from a list value, or returns `None` on a type clash.
    pub(crate) fn without(&self, item: &VariableValue) -> Option<Self> {
        match (self, item) {
            (Self::ListOfString(list), Self::String(s)) => Some(Self::ListOfString(
                list.iter().filter(|e| *e != s).cloned().collect(),
            )),
            (Self::ListOfNumeric(list), Self::Numeric(n)) => Some(Self::ListOfNumeric(
                list.iter().filter(|e| *e != n).copied().collect(),
            )),
            _ => None,
        }
    }
}

impl core::fmt::Display for VariableValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{:?}", s),
            Self::ListOfString(list) => write!(f, "{:?}", list),
            Self::ListOfNumeric(list) => write!(f, "{:?}", list),
            Self::Attribute(attr) if attr.partial => write!(f, "{:+} (partial)", attr.value),
            Self::Attribute(attr) => write!(f, "{:+}", attr.value),
        }
    }
}

fn append_unique<T: Clone + PartialEq>(list: &[T], items: &[T]) -> Vec<T> {
    let mut out = list.to_vec();
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// A typed, named slot in a variable store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    var_type: VariableType,
    base: VariableValue,
    value: VariableValue,
    bonuses: BonusStack,
}

impl Variable {
    /// Creates a variable whose type is taken from its initial value.
    pub fn new(name: impl Into<String>, initial: VariableValue) -> Self {
        Self {
            name: name.into(),
            var_type: initial.var_type(),
            value: initial.clone(),
            base: initial,
            bonuses: BonusStack::new(),
        }
    }

    /// Creates a variable holding the zero value of `var_type`.
    pub fn declare(name: impl Into<String>, var_type: VariableType) -> Self {
        Self::new(name, var_type.zero())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    /// Value before bonuses.
    pub fn base(&self) -> &VariableValue {
        &self.base
    }

    /// Resolved value including every applied bonus.
    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    pub fn bonuses(&self) -> &BonusStack {
        &self.bonuses
    }

    pub(crate) fn set_base(&mut self, value: VariableValue, rules: &StackingRules) {
        debug_assert_eq!(value.var_type(), self.var_type);
        self.base = value;
        self.recompute(rules);
    }

    pub(crate) fn push_bonus(&mut self, entry: BonusEntry, rules: &StackingRules) {
        self.bonuses.add(entry);
        self.recompute(rules);
    }

    fn recompute(&mut self, rules: &StackingRules) {
        self.value = if self.var_type.accepts_bonuses() {
            self.base.plus(self.bonuses.contribution(rules))
        } else {
            self.base.clone()
        };
    }
}

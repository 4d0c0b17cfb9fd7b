//! Predicates gating conditional operations.
//!
//! A predicate reads the variable store as it stands at the conditional's
//! position in the resolution pass. Later operations cannot retroactively
//! change an earlier conditional's outcome.

use crate::variable::{ScopeView, VariableValue};

/// Comparison operator of [`Predicate::Compare`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Comparison {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

impl Comparison {
    fn holds(&self, ordering: core::cmp::Ordering) -> bool {
        use core::cmp::Ordering::*;
        match self {
            Self::Eq => ordering == Equal,
            Self::Ne => ordering != Equal,
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
        }
    }
}

/// Boolean test over variables of one scope.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Predicate {
    Always,
    /// Variable exists.
    Defined(String),
    /// Boolean variable is true, numeric is non-zero, list or string non-empty.
    Truthy(String),
    Compare {
        variable: String,
        op: Comparison,
        value: VariableValue,
    },
    /// List variable holds `value`.
    Contains {
        variable: String,
        value: VariableValue,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(variable: impl Into<String>, op: Comparison, value: VariableValue) -> Self {
        Self::Compare {
            variable: variable.into(),
            op,
            value,
        }
    }

    pub fn contains(variable: impl Into<String>, value: VariableValue) -> Self {
        Self::Contains {
            variable: variable.into(),
            value,
        }
    }

    /// Evaluates against `view`. Tests on undefined variables are false.
    pub fn evaluate(&self, view: &ScopeView<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Defined(variable) => view.contains(variable),
            Self::Truthy(variable) => view.value(variable).is_some_and(truthy),
            Self::Compare {
                variable,
                op,
                value,
            } => view
                .value(variable)
                .and_then(|current| ordering(current, value, *op))
                .is_some_and(|ordering| op.holds(ordering)),
            Self::Contains { variable, value } => {
                view.value(variable).is_some_and(|list| list.contains(value))
            }
            Self::And(all) => all.iter().all(|p| p.evaluate(view)),
            Self::Or(any) => any.iter().any(|p| p.evaluate(view)),
            Self::Not(inner) => !inner.evaluate(view),
        }
    }
}

fn truthy(value: &VariableValue) -> bool {
    match value {
        VariableValue::Boolean(b) => *b,
        VariableValue::Numeric(n) => *n != 0,
        VariableValue::Attribute(attr) => attr.value != 0,
        VariableValue::String(s) => !s.is_empty(),
        VariableValue::ListOfString(list) => !list.is_empty(),
        VariableValue::ListOfNumeric(list) => !list.is_empty(),
    }
}

/// Orders `current` against `expected`. Numbers compare numerically; other
/// values only support equality tests.
fn ordering(
    current: &VariableValue,
    expected: &VariableValue,
    op: Comparison,
) -> Option<core::cmp::Ordering> {
    if let (Some(a), Some(b)) = (current.as_number(), expected.as_number()) {
        return Some(a.cmp(&b));
    }
    if current.var_type() != expected.var_type() {
        return None;
    }
    match op {
        Comparison::Eq | Comparison::Ne if current == expected => Some(core::cmp::Ordering::Equal),
        Comparison::Eq | Comparison::Ne => Some(core::cmp::Ordering::Less),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{AttributeValue, CHARACTER_SCOPE, StackingRules, VariableStore};

    fn store() -> VariableStore {
        let mut store = VariableStore::new(StackingRules::default());
        store
            .set(CHARACTER_SCOPE, "LEVEL", VariableValue::Numeric(5))
            .unwrap();
        store
            .set(
                CHARACTER_SCOPE,
                "ATTRIBUTE_STR",
                VariableValue::Attribute(AttributeValue::new(3)),
            )
            .unwrap();
        store
            .set(CHARACTER_SCOPE, "HAS_DARKVISION", VariableValue::Boolean(true))
            .unwrap();
        store
            .set(
                CHARACTER_SCOPE,
                "LANGUAGE_NAMES",
                VariableValue::ListOfString(vec!["Common".into()]),
            )
            .unwrap();
        store
    }

    #[test]
    fn numeric_comparisons() {
        let store = store();
        let view = store.scope(CHARACTER_SCOPE);
        let level = |op, n| Predicate::compare("LEVEL", op, VariableValue::Numeric(n));

        assert!(level(Comparison::Ge, 5).evaluate(&view));
        assert!(level(Comparison::Gt, 4).evaluate(&view));
        assert!(!level(Comparison::Lt, 5).evaluate(&view));
        assert!(level(Comparison::Ne, 1).evaluate(&view));
        assert!(
            Predicate::compare("ATTRIBUTE_STR", Comparison::Eq, VariableValue::Numeric(3))
                .evaluate(&view)
        );
    }

    #[test]
    fn undefined_variable_fails_every_comparison() {
        let store = store();
        let view = store.scope(CHARACTER_SCOPE);
        for op in [Comparison::Eq, Comparison::Ne, Comparison::Lt, Comparison::Ge] {
            assert!(!Predicate::compare("MISSING", op, VariableValue::Numeric(0)).evaluate(&view));
        }
        assert!(!Predicate::Defined("MISSING".into()).evaluate(&view));
        assert!(Predicate::Not(Box::new(Predicate::Defined("MISSING".into()))).evaluate(&view));
    }

    #[test]
    fn mismatched_types_compare_false() {
        let store = store();
        let view = store.scope(CHARACTER_SCOPE);
        let p = Predicate::compare("HAS_DARKVISION", Comparison::Ne, VariableValue::Numeric(1));
        assert!(!p.evaluate(&view));
    }

    #[test]
    fn combinators_and_contains() {
        let store = store();
        let view = store.scope(CHARACTER_SCOPE);
        let p = Predicate::And(vec![
            Predicate::Truthy("HAS_DARKVISION".into()),
            Predicate::Or(vec![
                Predicate::contains("LANGUAGE_NAMES", VariableValue::String("Elven".into())),
                Predicate::contains("LANGUAGE_NAMES", VariableValue::String("Common".into())),
            ]),
        ]);
        assert!(p.evaluate(&view));
    }

    #[test]
    fn comparison_display_uses_symbols() {
        assert_eq!(Comparison::Le.to_string(), "<=");
        assert_eq!(">=".parse::<Comparison>().ok(), Some(Comparison::Ge));
    }
}

//! Baseline character variables.
//!
//! Every resolution pass starts from the same declared variable set so that
//! content can adjust, bonus and test these names without declaring them.
//! Derived totals are computed once all operations have been applied.

use super::{AttributeValue, StoreError, VariableStore, VariableType, VariableValue};

pub const LEVEL: &str = "LEVEL";
pub const SIZE: &str = "SIZE";
pub const SPEED: &str = "SPEED";
pub const AC_BONUS: &str = "AC_BONUS";
pub const PERCEPTION_BONUS: &str = "PERCEPTION_BONUS";
pub const SAVE_FORT: &str = "SAVE_FORT";
pub const SAVE_REFLEX: &str = "SAVE_REFLEX";
pub const SAVE_WILL: &str = "SAVE_WILL";
pub const MAX_HEALTH: &str = "MAX_HEALTH";
pub const MAX_HEALTH_ANCESTRY: &str = "MAX_HEALTH_ANCESTRY";
pub const MAX_HEALTH_CLASS_PER_LEVEL: &str = "MAX_HEALTH_CLASS_PER_LEVEL";
pub const MAX_HEALTH_BONUS: &str = "MAX_HEALTH_BONUS";
pub const HAS_DARKVISION: &str = "HAS_DARKVISION";
pub const LANGUAGE_NAMES: &str = "LANGUAGE_NAMES";
pub const FEAT_IDS: &str = "FEAT_IDS";
pub const CLASS_FEATURE_IDS: &str = "CLASS_FEATURE_IDS";
pub const SPELL_IDS: &str = "SPELL_IDS";
pub const TRAIT_IDS: &str = "TRAIT_IDS";

pub const ATTRIBUTE_STR: &str = "ATTRIBUTE_STR";
pub const ATTRIBUTE_DEX: &str = "ATTRIBUTE_DEX";
pub const ATTRIBUTE_CON: &str = "ATTRIBUTE_CON";
pub const ATTRIBUTE_INT: &str = "ATTRIBUTE_INT";
pub const ATTRIBUTE_WIS: &str = "ATTRIBUTE_WIS";
pub const ATTRIBUTE_CHA: &str = "ATTRIBUTE_CHA";

pub const ATTRIBUTES: [&str; 6] = [
    ATTRIBUTE_STR,
    ATTRIBUTE_DEX,
    ATTRIBUTE_CON,
    ATTRIBUTE_INT,
    ATTRIBUTE_WIS,
    ATTRIBUTE_CHA,
];

const DEFAULT_SPEED: i64 = 25;
const DEFAULT_SIZE: &str = "MEDIUM";

/// Declares the standard variable set in `scope`.
pub fn seed_character_scope(
    store: &mut VariableStore,
    scope: &str,
    level: u32,
) -> Result<(), StoreError> {
    store.declare(scope, LEVEL, VariableValue::Numeric(i64::from(level)))?;

    for attribute in ATTRIBUTES {
        store.declare(
            scope,
            attribute,
            VariableValue::Attribute(AttributeValue::default()),
        )?;
    }

    for numeric in [
        MAX_HEALTH_ANCESTRY,
        MAX_HEALTH_CLASS_PER_LEVEL,
        MAX_HEALTH_BONUS,
        AC_BONUS,
        PERCEPTION_BONUS,
        SAVE_FORT,
        SAVE_REFLEX,
        SAVE_WILL,
    ] {
        store.declare(scope, numeric, VariableType::Numeric.zero())?;
    }
    store.declare(scope, SPEED, VariableValue::Numeric(DEFAULT_SPEED))?;
    store.declare(scope, SIZE, VariableValue::String(DEFAULT_SIZE.to_string()))?;
    store.declare(scope, HAS_DARKVISION, VariableValue::Boolean(false))?;

    for list in [LANGUAGE_NAMES, FEAT_IDS, CLASS_FEATURE_IDS, SPELL_IDS] {
        store.declare(scope, list, VariableType::ListOfString.zero())?;
    }
    store.declare(scope, TRAIT_IDS, VariableType::ListOfNumeric.zero())?;

    Ok(())
}

/// Computes derived totals from the resolved inputs.
///
/// ```text
/// MAX_HEALTH = MAX_HEALTH_ANCESTRY
///            + (MAX_HEALTH_CLASS_PER_LEVEL + CON) × LEVEL
///            + MAX_HEALTH_BONUS
/// ```
///
/// Inputs that content redeclared with a non-numeric type count as zero.
pub fn finalize_derived(store: &mut VariableStore, scope: &str) -> Result<(), StoreError> {
    let view = store.scope(scope);
    let number = |name: &str| view.value(name).and_then(VariableValue::as_number).unwrap_or(0);

    let per_level = number(MAX_HEALTH_CLASS_PER_LEVEL).saturating_add(number(ATTRIBUTE_CON));
    let max_health = number(MAX_HEALTH_ANCESTRY)
        .saturating_add(per_level.saturating_mul(number(LEVEL)))
        .saturating_add(number(MAX_HEALTH_BONUS));

    store.set(scope, MAX_HEALTH, VariableValue::Numeric(max_health.max(1)))
}

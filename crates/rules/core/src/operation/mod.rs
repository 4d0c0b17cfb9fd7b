//! Operations - immutable descriptions of rule effects.
//!
//! Content entities carry ordered operation lists. An [`Operation`] does
//! nothing by itself; the resolver interprets it against a variable store.
//! Every kind has its own payload struct, so the set of effects is closed:
//! adding a kind means adding a variant here and an arm in the resolver.
//!
//! Operations compose in two ways:
//! - [`Grant`] inlines another entity's operation list
//! - [`Select`] and [`Conditional`] carry nested operation lists that are
//!   spliced into the pass when the choice is made or the predicate holds

mod predicate;

pub use predicate::{Comparison, Predicate};

use crate::content::ContentRef;
use crate::variable::{BonusEntry, BonusType, VariableValue};

/// Stable identifier of an operation.
///
/// Persisted selections and notes are keyed by this id, so it must survive
/// content edits for a player's choices to survive them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OperationId(uuid::Uuid);

impl OperationId {
    /// Fresh random id for newly authored operations.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Deterministic id, mostly for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl core::fmt::Display for OperationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl core::str::FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim()).map(Self)
    }
}

/// One rule effect attached to a content entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation {
    pub id: OperationId,
    /// Contributing entity. Filled in by content providers; the resolver
    /// falls back to the entity it is expanding.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub source: Option<ContentRef>,
    pub kind: OperationKind,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self::with_id(OperationId::random(), kind)
    }

    pub fn with_id(id: OperationId, kind: OperationKind) -> Self {
        Self {
            id,
            source: None,
            kind,
        }
    }

    /// Stamps `source` on this operation and every nested one that has none.
    #[must_use]
    pub fn attributed_to(mut self, source: &ContentRef) -> Self {
        self.attribute(source);
        self
    }

    fn attribute(&mut self, source: &ContentRef) {
        if self.source.is_none() {
            self.source = Some(source.clone());
        }
        match &mut self.kind {
            OperationKind::Select(select) => select
                .options
                .iter_mut()
                .flat_map(|o| o.operations.iter_mut())
                .for_each(|op| op.attribute(source)),
            OperationKind::Conditional(cond) => cond
                .then
                .iter_mut()
                .chain(cond.otherwise.iter_mut())
                .for_each(|op| op.attribute(source)),
            _ => {}
        }
    }

    pub fn tag(&self) -> OperationTag {
        OperationTag::from(&self.kind)
    }

    /// Directly nested operations (select options and conditional branches).
    pub fn children(&self) -> Vec<&Operation> {
        match &self.kind {
            OperationKind::Select(select) => select
                .options
                .iter()
                .flat_map(|o| o.operations.iter())
                .collect(),
            OperationKind::Conditional(cond) => {
                cond.then.iter().chain(cond.otherwise.iter()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Depth-first search for an operation by id, including this one.
    pub fn find(&self, id: OperationId) -> Option<&Operation> {
        if self.id == id {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(id))
    }

    pub fn as_select(&self) -> Option<&Select> {
        match &self.kind {
            OperationKind::Select(select) => Some(select),
            _ => None,
        }
    }

    // ===== constructors =====

    pub fn create_value(variable: impl Into<String>, value: VariableValue) -> Self {
        Self::new(OperationKind::CreateValue(ValueChange::new(variable, value)))
    }

    pub fn set_value(variable: impl Into<String>, value: VariableValue) -> Self {
        Self::new(OperationKind::SetValue(ValueChange::new(variable, value)))
    }

    pub fn adj_value(variable: impl Into<String>, value: VariableValue) -> Self {
        Self::new(OperationKind::AdjValue(ValueChange::new(variable, value)))
    }

    pub fn remove_value(variable: impl Into<String>, value: VariableValue) -> Self {
        Self::new(OperationKind::RemoveValue(ValueChange::new(variable, value)))
    }

    pub fn add_bonus(variable: impl Into<String>, value: i64, bonus_type: &str) -> Self {
        Self::new(OperationKind::AddBonusToValue(AddBonusToValue {
            variable: variable.into(),
            value,
            bonus_type: Some(bonus_type.to_string()),
            text: None,
            auto_apply: false,
        }))
    }

    pub fn give_language(language: impl Into<String>) -> Self {
        Self::new(OperationKind::GiveLanguage(GiveLanguage {
            language: language.into(),
        }))
    }

    pub fn give_trait(trait_id: i64) -> Self {
        Self::new(OperationKind::GiveTrait(GiveTrait { trait_id }))
    }

    pub fn grant(entity: ContentRef) -> Self {
        Self::new(OperationKind::Grant(Grant { entity }))
    }

    pub fn select(title: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(OperationKind::Select(Select {
            title: title.into(),
            options,
        }))
    }

    pub fn conditional(predicate: Predicate, then: Vec<Operation>, otherwise: Vec<Operation>) -> Self {
        Self::new(OperationKind::Conditional(Conditional {
            predicate,
            then,
            otherwise,
        }))
    }

    pub fn notify(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(OperationKind::SendNotification(SendNotification {
            title: title.into(),
            message: message.into(),
        }))
    }
}

/// Kind-specific payload of an operation.
#[derive(Clone, Debug, PartialEq, Eq, strum::EnumDiscriminants)]
#[strum_discriminants(
    name(OperationTag),
    derive(Hash, PartialOrd, Ord, strum::Display, strum::AsRefStr, strum::EnumString),
    strum(serialize_all = "camelCase")
)]
#[cfg_attr(
    feature = "serde",
    strum_discriminants(derive(serde::Serialize, serde::Deserialize)),
    strum_discriminants(serde(rename_all = "camelCase"))
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum OperationKind {
    /// Declares a variable with an initial value.
    CreateValue(ValueChange),
    /// Overwrites a variable's base value.
    SetValue(ValueChange),
    /// Adjusts a variable's base value (add, boost, append).
    AdjValue(ValueChange),
    /// Removes an element from a list variable.
    RemoveValue(ValueChange),
    /// Adds a stacking bonus.
    AddBonusToValue(AddBonusToValue),
    GiveLanguage(GiveLanguage),
    GiveSpell(GiveSpell),
    GiveTrait(GiveTrait),
    /// Inlines another entity's operations.
    Grant(Grant),
    /// Player choice among options.
    Select(Select),
    /// Gated branch evaluated against the store at its position in the pass.
    Conditional(Conditional),
    /// Message surfaced in the resolution report.
    SendNotification(SendNotification),
}

/// Target variable and value for create/set/adjust/remove.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueChange {
    pub variable: String,
    pub value: VariableValue,
}

impl ValueChange {
    pub fn new(variable: impl Into<String>, value: VariableValue) -> Self {
        Self {
            variable: variable.into(),
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddBonusToValue {
    pub variable: String,
    pub value: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bonus_type: Option<String>,
    /// Conditional text; non-empty text makes the bonus advisory.
    #[cfg_attr(feature = "serde", serde(default))]
    pub text: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_apply: bool,
}

impl AddBonusToValue {
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Stacking entry this operation contributes.
    pub fn entry(&self) -> BonusEntry {
        BonusEntry {
            amount: self.value,
            bonus_type: BonusType::from_label(self.bonus_type.as_deref()),
            source: None,
            operation: None,
            conditional_text: self.text.clone(),
            auto_apply: self.auto_apply,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GiveLanguage {
    pub language: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GiveSpell {
    pub spell_id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rank: Option<u8>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub casting_source: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GiveTrait {
    pub trait_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grant {
    pub entity: ContentRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Select {
    pub title: String,
    pub options: Vec<SelectOption>,
}

impl Select {
    pub fn option(&self, id: OperationId) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// One choice of a [`Select`]; choosing it splices its operations into the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectOption {
    pub id: OperationId,
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operations: Vec<Operation>,
}

impl SelectOption {
    pub fn new(id: OperationId, label: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            id,
            label: label.into(),
            operations,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conditional {
    pub predicate: Predicate,
    #[cfg_attr(feature = "serde", serde(default))]
    pub then: Vec<Operation>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub otherwise: Vec<Operation>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SendNotification {
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_follow_operation_kind_names() {
        assert_eq!(
            Operation::add_bonus("AC_BONUS", 1, "item").tag().to_string(),
            "addBonusToValue"
        );
        assert_eq!(
            Operation::adj_value("SPEED", VariableValue::Numeric(5))
                .tag()
                .to_string(),
            "adjValue"
        );
        assert_eq!("select".parse::<OperationTag>().ok(), Some(OperationTag::Select));
    }

    #[test]
    fn attribution_reaches_nested_operations() {
        let inner = Operation::give_language("Elven");
        let inner_id = inner.id;
        let op = Operation::select(
            "Language",
            vec![SelectOption::new(OperationId::from_u128(7), "Elven", vec![inner])],
        )
        .attributed_to(&ContentRef::ancestry("elf"));

        let found = op.find(inner_id).and_then(|o| o.source.clone());
        assert_eq!(found, Some(ContentRef::ancestry("elf")));
    }

    #[test]
    fn attribution_keeps_existing_source() {
        let op = Operation {
            source: Some(ContentRef::feat("toughness")),
            ..Operation::give_trait(3)
        }
        .attributed_to(&ContentRef::class("fighter"));
        assert_eq!(op.source, Some(ContentRef::feat("toughness")));
    }

    #[test]
    fn operation_id_parses_uuid_text() {
        let id = OperationId::from_u128(42);
        let parsed: OperationId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<OperationId>().is_err());
    }

    #[test]
    fn bonus_entry_normalises_type() {
        let op = AddBonusToValue {
            variable: "AC_BONUS".into(),
            value: 2,
            bonus_type: Some("Item".into()),
            text: None,
            auto_apply: false,
        };
        assert_eq!(op.entry().bonus_type, BonusType::Typed("item".into()));
    }
}

//! Character record consumed by the resolver.
//!
//! A character references content by id and owns the only durable rules
//! state: player choices and notes in [`OperationData`] plus its custom
//! operations. Everything else is derived on each resolution pass.

use std::collections::BTreeMap;

use crate::content::{ContentKind, ContentRef};
use crate::operation::{Operation, OperationId};

/// An item carried by a character.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemSlot {
    pub item_id: String,
    /// Ordering key among items; lower slots resolve first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub slot: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub equipped: bool,
}

impl ItemSlot {
    pub fn equipped(item_id: impl Into<String>, slot: u32) -> Self {
        Self {
            item_id: item_id.into(),
            slot,
            equipped: true,
        }
    }

    pub fn stowed(item_id: impl Into<String>, slot: u32) -> Self {
        Self {
            equipped: false,
            ..Self::equipped(item_id, slot)
        }
    }
}

/// Player choices and annotations keyed by operation id.
///
/// Keys and values are kept as text so a record written against older
/// content survives loading even when its ids no longer parse or exist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationData {
    /// `select` operation id -> chosen option id.
    #[cfg_attr(feature = "serde", serde(default))]
    pub selections: BTreeMap<String, String>,
    /// Operation id -> free text.
    #[cfg_attr(feature = "serde", serde(default))]
    pub notes: BTreeMap<String, String>,
}

impl OperationData {
    /// Stored option for a `select` operation, as written.
    ///
    /// Keys are matched by parsed id, so casing and whitespace differences
    /// in hand-edited records still resolve.
    pub fn selection(&self, operation: OperationId) -> Option<&str> {
        lookup(&self.selections, operation)
    }

    /// Stored selections keyed by parsed operation id. Keys that do not
    /// parse are left out.
    pub fn parsed_selections(&self) -> BTreeMap<OperationId, &str> {
        self.selections
            .iter()
            .filter_map(|(key, option)| {
                key.parse::<OperationId>()
                    .ok()
                    .map(|id| (id, option.as_str()))
            })
            .collect()
    }

    /// Stores a choice under the canonical key, replacing any spelling of
    /// the same id.
    pub fn record_selection(&mut self, operation: OperationId, option: OperationId) {
        remove(&mut self.selections, operation);
        self.selections
            .insert(operation.to_string(), option.to_string());
    }

    /// Removes a stored choice. Returns true if one was present.
    pub fn clear_selection(&mut self, operation: OperationId) -> bool {
        remove(&mut self.selections, operation)
    }

    pub fn note(&self, operation: OperationId) -> Option<&str> {
        lookup(&self.notes, operation)
    }

    pub fn set_note(&mut self, operation: OperationId, text: impl Into<String>) {
        remove(&mut self.notes, operation);
        self.notes.insert(operation.to_string(), text.into());
    }

    pub fn clear_note(&mut self, operation: OperationId) -> bool {
        remove(&mut self.notes, operation)
    }
}

fn same_operation(key: &str, operation: OperationId) -> bool {
    key.parse::<OperationId>().is_ok_and(|id| id == operation)
}

fn lookup(map: &BTreeMap<String, String>, operation: OperationId) -> Option<&str> {
    map.get(&operation.to_string())
        .or_else(|| {
            map.iter()
                .find(|(key, _)| same_operation(key, operation))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

fn remove(map: &mut BTreeMap<String, String>, operation: OperationId) -> bool {
    let before = map.len();
    map.retain(|key, _| !same_operation(key, operation));
    map.len() != before
}

/// A player character as stored by the application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Character {
    pub id: String,
    pub name: String,
    pub level: u32,
    /// Enabled content sources (books, homebrew packs).
    #[cfg_attr(feature = "serde", serde(default))]
    pub content_sources: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ancestry: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub background: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub class: Option<String>,
    /// Feats in acquisition order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub feats: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub items: Vec<ItemSlot>,
    /// Active conditions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditions: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub custom_operations: Vec<Operation>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operation_data: OperationData,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ancestry(mut self, id: impl Into<String>) -> Self {
        self.ancestry = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_background(mut self, id: impl Into<String>) -> Self {
        self.background = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_class(mut self, id: impl Into<String>) -> Self {
        self.class = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_feat(mut self, id: impl Into<String>) -> Self {
        self.feats.push(id.into());
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemSlot) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, id: impl Into<String>) -> Self {
        self.conditions.push(id.into());
        self
    }

    #[must_use]
    pub fn with_content_source(mut self, id: impl Into<String>) -> Self {
        self.content_sources.push(id.into());
        self
    }

    #[must_use]
    pub fn with_custom_operation(mut self, operation: Operation) -> Self {
        self.custom_operations.push(operation);
        self
    }

    /// Equipped items ordered by slot. Ties keep insertion order.
    pub fn equipped_items(&self) -> Vec<&ItemSlot> {
        let mut items: Vec<_> = self.items.iter().filter(|i| i.equipped).collect();
        items.sort_by_key(|i| i.slot);
        items
    }

    /// Top-level content entities in resolution precedence, excluding class
    /// features (those depend on the content provider).
    ///
    /// The class is followed by its features, which the resolver inserts.
    pub fn content_refs(&self) -> Vec<ContentRef> {
        let mut refs: Vec<ContentRef> = self
            .content_sources
            .iter()
            .map(|id| ContentRef::new(ContentKind::ContentSource, id.as_str()))
            .collect();
        refs.extend(self.ancestry.iter().map(ContentRef::ancestry));
        refs.extend(self.background.iter().map(ContentRef::background));
        refs.extend(self.class.iter().map(ContentRef::class));
        refs.extend(self.feats.iter().map(ContentRef::feat));
        refs.extend(
            self.equipped_items()
                .into_iter()
                .map(|i| ContentRef::item(i.item_id.as_str())),
        );
        refs.extend(self.conditions.iter().map(ContentRef::condition));
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_refs_follow_precedence() {
        let character = Character::new("c1", "Valeros", 1)
            .with_condition("frightened")
            .with_feat("toughness")
            .with_item(ItemSlot::equipped("shield", 2))
            .with_item(ItemSlot::stowed("rope", 0))
            .with_item(ItemSlot::equipped("armor", 1))
            .with_class("fighter")
            .with_background("farmhand")
            .with_ancestry("human")
            .with_content_source("core");

        let refs: Vec<String> = character
            .content_refs()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            refs,
            vec![
                "content_source:core",
                "ancestry:human",
                "background:farmhand",
                "class:fighter",
                "feat:toughness",
                "item:armor",
                "item:shield",
                "condition:frightened",
            ]
        );
    }

    #[test]
    fn operation_data_round_trip() {
        let mut data = OperationData::default();
        let op = OperationId::from_u128(1);
        let option = OperationId::from_u128(2);

        data.record_selection(op, option);
        assert_eq!(data.selection(op), Some(option.to_string().as_str()));
        assert!(data.clear_selection(op));
        assert!(!data.clear_selection(op));

        data.set_note(op, "retrained at level 4");
        assert_eq!(data.note(op), Some("retrained at level 4"));
        assert!(data.clear_note(op));
        assert_eq!(data.note(op), None);
    }

    #[test]
    fn operation_data_matches_keys_by_parsed_id() {
        let op = OperationId::from_u128(0xabc);
        let option = OperationId::from_u128(0xdef);
        let mut data = OperationData::default();
        data.selections
            .insert(op.to_string().to_uppercase(), option.to_string());

        assert_eq!(data.selection(op), Some(option.to_string().as_str()));
        assert_eq!(
            data.parsed_selections().get(&op).copied(),
            Some(option.to_string().as_str())
        );

        data.record_selection(op, option);
        assert_eq!(data.selections.len(), 1);
        assert!(data.selections.contains_key(&op.to_string()));
        assert!(data.clear_selection(op));
        assert!(data.selections.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn character_round_trips_through_json() {
        let mut character = Character::new("c1", "Kyra", 2)
            .with_ancestry("human")
            .with_item(ItemSlot::stowed("rope", 1))
            .with_custom_operation(Operation::give_language("Draconic"));
        character
            .operation_data
            .record_selection(OperationId::from_u128(1), OperationId::from_u128(2));

        let json = serde_json::to_string(&character).unwrap();
        let restored: Character = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, character);

        let minimal: Character =
            serde_json::from_str(r#"{"id":"m","name":"Merisiel","level":1}"#).unwrap();
        assert!(minimal.operation_data.selections.is_empty());
        assert!(minimal.items.is_empty());
    }
}

//! In-memory content catalog.

use std::collections::{BTreeMap, BTreeSet};

use rules_core::{
    ClassFeature, ContentKind, ContentProvider, ContentRef, Operation, ProviderError,
};

/// A content entity with its ordered operation list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityDefinition {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operations: Vec<Operation>,
}

impl EntityDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            operations,
        }
    }
}

/// A class feature definition; unlocks at `level`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassFeatureDefinition {
    pub id: String,
    pub name: String,
    pub level: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operations: Vec<Operation>,
}

/// A class with its level-gated features.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassDefinition {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operations: Vec<Operation>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub features: Vec<ClassFeatureDefinition>,
}

/// Errors raised while assembling a catalog.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("content {0} is defined twice")]
    Duplicate(ContentRef),
}

/// Content provider backed by in-memory definitions.
///
/// Operations are returned exactly as authored; the resolver attributes
/// them to the entity being expanded.
#[derive(Clone, Debug, Default)]
pub struct ContentCatalog {
    entities: BTreeMap<ContentRef, EntityDefinition>,
    /// Class id -> features in author order.
    features: BTreeMap<String, Vec<ClassFeature>>,
}

impl ContentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity of `kind`. Ids must be unique per kind.
    pub fn insert(&mut self, kind: ContentKind, entity: EntityDefinition) -> Result<(), CatalogError> {
        let key = ContentRef::new(kind, entity.id.as_str());
        if self.entities.contains_key(&key) {
            return Err(CatalogError::Duplicate(key));
        }
        self.entities.insert(key, entity);
        Ok(())
    }

    /// Adds a class and registers its features.
    pub fn insert_class(&mut self, class: ClassDefinition) -> Result<(), CatalogError> {
        let ClassDefinition {
            id,
            name,
            operations,
            features,
        } = class;

        let mut seen = BTreeSet::new();
        for feature in &features {
            let key = ContentRef::class_feature(feature.id.as_str());
            if self.entities.contains_key(&key) || !seen.insert(feature.id.as_str()) {
                return Err(CatalogError::Duplicate(key));
            }
        }
        self.insert(ContentKind::Class, EntityDefinition::new(id.as_str(), name, operations))?;

        let unlocked = self.features.entry(id).or_default();
        for feature in features {
            unlocked.push(ClassFeature {
                id: feature.id.clone(),
                level: feature.level,
            });
            self.entities.insert(
                ContentRef::class_feature(feature.id.as_str()),
                EntityDefinition::new(feature.id, feature.name, feature.operations),
            );
        }
        Ok(())
    }

    pub fn get(&self, entity: &ContentRef) -> Option<&EntityDefinition> {
        self.entities.get(entity)
    }

    /// Entities of one kind, ordered by id.
    pub fn of_kind(&self, kind: ContentKind) -> impl Iterator<Item = &EntityDefinition> {
        self.entities
            .iter()
            .filter(move |(key, _)| key.kind == kind)
            .map(|(_, entity)| entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl ContentProvider for ContentCatalog {
    fn operations(&self, entity: &ContentRef) -> Result<Option<Vec<Operation>>, ProviderError> {
        Ok(self.entities.get(entity).map(|e| e.operations.clone()))
    }

    fn class_features(&self, class_id: &str, level: u32) -> Result<Vec<ClassFeature>, ProviderError> {
        let mut unlocked: Vec<ClassFeature> = self
            .features
            .get(class_id)
            .into_iter()
            .flatten()
            .filter(|feature| feature.level <= level)
            .cloned()
            .collect();
        // Stable sort keeps author order within a level.
        unlocked.sort_by_key(|feature| feature.level);
        Ok(unlocked)
    }
}

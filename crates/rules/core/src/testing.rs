//! Fixture content provider for unit tests.

use std::collections::BTreeMap;

use crate::content::{ClassFeature, ContentProvider, ContentRef, ProviderError};
use crate::operation::Operation;

#[derive(Default)]
pub(crate) struct StaticProvider {
    entities: BTreeMap<ContentRef, Vec<Operation>>,
    features: BTreeMap<String, Vec<ClassFeature>>,
}

impl StaticProvider {
    pub(crate) fn with(mut self, entity: ContentRef, operations: Vec<Operation>) -> Self {
        self.entities.insert(entity, operations);
        self
    }

    pub(crate) fn with_feature(
        mut self,
        class_id: &str,
        level: u32,
        feature_id: &str,
        operations: Vec<Operation>,
    ) -> Self {
        self.features
            .entry(class_id.to_string())
            .or_default()
            .push(ClassFeature {
                id: feature_id.to_string(),
                level,
            });
        self.with(ContentRef::class_feature(feature_id), operations)
    }
}

impl ContentProvider for StaticProvider {
    fn operations(&self, entity: &ContentRef) -> Result<Option<Vec<Operation>>, ProviderError> {
        Ok(self.entities.get(entity).cloned())
    }

    fn class_features(&self, class_id: &str, level: u32) -> Result<Vec<ClassFeature>, ProviderError> {
        let mut features: Vec<ClassFeature> = self
            .features
            .get(class_id)
            .into_iter()
            .flatten()
            .filter(|f| f.level <= level)
            .cloned()
            .collect();
        features.sort_by_key(|f| f.level);
        Ok(features)
    }
}

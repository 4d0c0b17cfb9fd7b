//! Content references and the read-only content provider seam.
//!
//! Game content (ancestries, classes, feats, items...) is owned by an
//! external collaborator. The resolver only needs the ordered operation list
//! attached to an entity, obtained through [`ContentProvider`]. Providers
//! must return operations in a stable, author-defined order.

use thiserror::Error;

use crate::error::{ErrorSeverity, RulesError};
use crate::operation::Operation;

/// Category of a content entity.
///
/// Declaration order is the resolution precedence of top-level sources.
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
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentKind {
    ContentSource,
    Ancestry,
    Background,
    Class,
    ClassFeature,
    Feat,
    Item,
    Condition,
    Custom,
}

impl ContentKind {
    /// Kinds whose grants are recorded in a list variable.
    pub const fn granted_list(&self) -> Option<&'static str> {
        match self {
            Self::Feat => Some(crate::variable::defaults::FEAT_IDS),
            Self::ClassFeature => Some(crate::variable::defaults::CLASS_FEATURE_IDS),
            _ => None,
        }
    }
}

/// Reference to one content entity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: String,
}

impl ContentRef {
    pub fn new(kind: ContentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn ancestry(id: impl Into<String>) -> Self {
        Self::new(ContentKind::Ancestry, id)
    }

    pub fn background(id: impl Into<String>) -> Self {
        Self::new(ContentKind::Background, id)
    }

    pub fn class(id: impl Into<String>) -> Self {
        Self::new(ContentKind::Class, id)
    }

    pub fn class_feature(id: impl Into<String>) -> Self {
        Self::new(ContentKind::ClassFeature, id)
    }

    pub fn feat(id: impl Into<String>) -> Self {
        Self::new(ContentKind::Feat, id)
    }

    pub fn item(id: impl Into<String>) -> Self {
        Self::new(ContentKind::Item, id)
    }

    pub fn condition(id: impl Into<String>) -> Self {
        Self::new(ContentKind::Condition, id)
    }

    /// Pseudo-entity owning a character's custom operations.
    pub fn custom(character_id: impl Into<String>) -> Self {
        Self::new(ContentKind::Custom, character_id)
    }
}

impl core::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Class feature unlocked at a given class level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassFeature {
    pub id: String,
    pub level: u32,
}

/// Errors raised by content providers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("content provider unavailable: {0}")]
    Unavailable(String),

    #[error("content {entity} is malformed: {message}")]
    Malformed { entity: ContentRef, message: String },
}

impl RulesError for ProviderError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "provider_unavailable",
            Self::Malformed { .. } => "content_malformed",
        }
    }
}

/// Read-only access to content entities' operations.
pub trait ContentProvider: Send + Sync {
    /// Operations attached to `entity`, in author order.
    ///
    /// Returns `Ok(None)` if the entity is unknown.
    fn operations(&self, entity: &ContentRef) -> Result<Option<Vec<Operation>>, ProviderError>;

    /// Features of `class_id` unlocked at or below `level`, ordered by level
    /// and then author order.
    fn class_features(
        &self,
        _class_id: &str,
        _level: u32,
    ) -> Result<Vec<ClassFeature>, ProviderError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_ref_display() {
        assert_eq!(ContentRef::feat("toughness").to_string(), "feat:toughness");
        assert_eq!(
            ContentRef::class_feature("rage").to_string(),
            "class_feature:rage"
        );
    }

    #[test]
    fn kind_parses_snake_case() {
        assert_eq!(
            "content_source".parse::<ContentKind>().ok(),
            Some(ContentKind::ContentSource)
        );
    }
}

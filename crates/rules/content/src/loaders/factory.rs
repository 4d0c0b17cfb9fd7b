//! Content factory for building a catalog from data files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rules_core::{ContentKind, ResolverConfig};

use crate::catalog::{ContentCatalog, EntityDefinition};
use crate::loaders::{ClassLoader, ConfigLoader, EntityLoader, LoadResult};

/// Entity files and the kind each one holds.
const ENTITY_FILES: [(&str, ContentKind); 6] = [
    ("sources.ron", ContentKind::ContentSource),
    ("ancestries.ron", ContentKind::Ancestry),
    ("backgrounds.ron", ContentKind::Background),
    ("feats.ron", ContentKind::Feat),
    ("items.ron", ContentKind::Item),
    ("conditions.ron", ContentKind::Condition),
];

const CLASS_FILE: &str = "classes.ron";
const CONFIG_FILE: &str = "config.toml";

/// Content factory that loads all rules content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── sources.ron
/// ├── ancestries.ron
/// ├── backgrounds.ron
/// ├── classes.ron
/// ├── feats.ron
/// ├── items.ron
/// └── conditions.ron
/// ```
///
/// Every file is optional; a missing file contributes nothing.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load resolver configuration from `config.toml`, or defaults.
    pub fn load_config(&self) -> LoadResult<ResolverConfig> {
        ConfigLoader::load_or_default(&self.data_dir.join(CONFIG_FILE))
    }

    /// Load entities of one kind from their file.
    pub fn load_entities(&self, file: &str) -> LoadResult<Vec<EntityDefinition>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "content file absent");
            return Ok(Vec::new());
        }
        EntityLoader::load(&path)
    }

    /// Load every content file into one catalog.
    pub fn load_catalog(&self) -> LoadResult<ContentCatalog> {
        let mut catalog = ContentCatalog::new();

        for (file, kind) in ENTITY_FILES {
            for entity in self.load_entities(file)? {
                catalog
                    .insert(kind, entity)
                    .with_context(|| format!("Invalid content in {}", file))?;
            }
        }

        let classes = self.data_dir.join(CLASS_FILE);
        if classes.exists() {
            for class in ClassLoader::load(&classes)? {
                catalog
                    .insert_class(class)
                    .with_context(|| format!("Invalid content in {}", CLASS_FILE))?;
            }
        }

        tracing::info!(
            data_dir = %self.data_dir.display(),
            entities = catalog.len(),
            "content catalog loaded"
        );
        Ok(catalog)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

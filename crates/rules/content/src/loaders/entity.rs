//! Entity catalog loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::EntityDefinition;
use crate::loaders::{LoadResult, read_file};

/// Entity file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityFile {
    pub entities: Vec<EntityDefinition>,
}

/// Loader for ancestries, backgrounds, feats, items, conditions and content
/// sources from RON files.
pub struct EntityLoader;

impl EntityLoader {
    /// Load entity definitions from a RON file, in file order.
    pub fn load(path: &Path) -> LoadResult<Vec<EntityDefinition>> {
        let content = read_file(path)?;
        let file: EntityFile = ron::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse entity RON {}: {}", path.display(), e)
        })?;

        Ok(file.entities)
    }
}

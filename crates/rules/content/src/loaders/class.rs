//! Class catalog loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::ClassDefinition;
use crate::loaders::{LoadResult, read_file};

/// Class file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassFile {
    pub classes: Vec<ClassDefinition>,
}

/// Loader for classes and their features from RON files.
pub struct ClassLoader;

impl ClassLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<ClassDefinition>> {
        let content = read_file(path)?;
        let file: ClassFile = ron::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse class RON {}: {}", path.display(), e)
        })?;

        Ok(file.classes)
    }
}

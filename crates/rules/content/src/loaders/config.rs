//! Resolver configuration loader.

use std::path::Path;

use rules_core::ResolverConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for resolver configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Keys absent from the file keep their defaults.
    pub fn load(path: &Path) -> LoadResult<ResolverConfig> {
        let content = read_file(path)?;
        let config: ResolverConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }

    /// Like [`ConfigLoader::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> LoadResult<ResolverConfig> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no resolver config, using defaults");
            return Ok(ResolverConfig::default());
        }
        Self::load(path)
    }
}

//! Content loaders for reading rules content from files.
//!
//! Entities are authored in RON, resolver configuration in TOML. Loaders
//! return plain definitions; [`ContentFactory`] assembles them into a
//! [`ContentCatalog`](crate::ContentCatalog).

pub mod class;
pub mod config;
pub mod entity;
pub mod factory;

pub use class::ClassLoader;
pub use config::ConfigLoader;
pub use entity::EntityLoader;
pub use factory::ContentFactory;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

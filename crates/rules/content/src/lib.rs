//! Data-driven rules content and loaders.
//!
//! This crate provides the content side of rules resolution:
//! - An in-memory [`ContentCatalog`] implementing [`rules_core::ContentProvider`]
//! - Entity catalogs (content sources, ancestries, backgrounds, feats, items,
//!   conditions) loaded from RON
//! - Classes with level-gated features loaded from RON
//! - Resolver configuration loaded from TOML
//!
//! Content is read by the resolver and never appears in a character record.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::{
    CatalogError, ClassDefinition, ClassFeatureDefinition, ContentCatalog, EntityDefinition,
};

#[cfg(feature = "loaders")]
pub use loaders::{ClassLoader, ConfigLoader, ContentFactory, EntityLoader, LoadResult};

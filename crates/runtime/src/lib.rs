//! Runtime orchestration for character-sheet resolution.
//!
//! This crate wires the rules engine to persistence and content loading.
//! Consumers embed [`Runtime`] to resolve stored characters, record player
//! choices and subscribe to resolution events.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the error types downstream clients interact with
//! - [`events`] broadcasts resolution outcomes
//! - [`repository`] stores character records in memory or as JSON files
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;

pub use api::{Result, RuntimeError};
pub use events::{EventBus, ResolutionSummary, RuntimeEvent};
pub use repository::{
    CharacterRepository, FileCharacterRepo, InMemoryCharacterRepo, OperationDataEdit,
    RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};

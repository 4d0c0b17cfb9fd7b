//! Persistence layer for character records.
//!
//! Repositories store only what a player authored: content references,
//! custom operations and `operation_data`. Every variable store is derived
//! again on load.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileCharacterRepo;
pub use memory::InMemoryCharacterRepo;
pub use traits::{CharacterRepository, OperationDataEdit};

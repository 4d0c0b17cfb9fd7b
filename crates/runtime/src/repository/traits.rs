//! Repository trait definitions.

use rules_core::{Character, OperationData};

use super::Result;

/// Edit applied to a character's `operation_data` under the repository lock.
pub type OperationDataEdit<'a> = Box<dyn FnOnce(&mut OperationData) + Send + 'a>;

/// Repository for character records.
///
/// The repository holds the only durable rules state: content references,
/// custom operations and `operation_data`. Resolved stores are never
/// persisted.
pub trait CharacterRepository: Send + Sync {
    /// Load a character by id.
    fn load(&self, id: &str) -> Result<Character>;

    /// Save a character, replacing any record with the same id.
    fn save(&self, character: &Character) -> Result<()>;

    /// Ids of every stored character, in ascending order.
    fn list(&self) -> Result<Vec<String>>;

    /// Delete a character. Returns whether a record existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Apply `edit` to the stored `operation_data` as a single
    /// read-modify-write and return the updated character.
    ///
    /// Concurrent updates to the same character never lose writes.
    fn update_operation_data(&self, id: &str, edit: OperationDataEdit<'_>) -> Result<Character>;

    fn exists(&self, id: &str) -> Result<bool> {
        match self.load(id) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

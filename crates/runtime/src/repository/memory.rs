//! In-memory character repository.

use std::collections::BTreeMap;
use std::sync::RwLock;

use rules_core::Character;

use super::{CharacterRepository, OperationDataEdit, RepositoryError, Result};

/// In-memory implementation of [`CharacterRepository`].
///
/// Useful for testing and for hosts that keep characters elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryCharacterRepo {
    characters: RwLock<BTreeMap<String, Character>>,
}

impl InMemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `characters`.
    pub fn with_characters(characters: impl IntoIterator<Item = Character>) -> Self {
        let characters = characters
            .into_iter()
            .map(|character| (character.id.clone(), character))
            .collect();
        Self {
            characters: RwLock::new(characters),
        }
    }
}

impl CharacterRepository for InMemoryCharacterRepo {
    fn load(&self, id: &str) -> Result<Character> {
        let characters = self
            .characters
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        characters
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn save(&self, character: &Character) -> Result<()> {
        let mut characters = self
            .characters
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        characters.insert(character.id.clone(), character.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let characters = self
            .characters
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(characters.keys().cloned().collect())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut characters = self
            .characters
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(characters.remove(id).is_some())
    }

    fn update_operation_data(&self, id: &str, edit: OperationDataEdit<'_>) -> Result<Character> {
        let mut characters = self
            .characters
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let character = characters
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        edit(&mut character.operation_data);
        Ok(character.clone())
    }
}

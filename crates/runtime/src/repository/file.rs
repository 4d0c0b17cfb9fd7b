//! File-based CharacterRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rules_core::Character;

use super::{CharacterRepository, OperationDataEdit, RepositoryError, Result};

const EXTENSION: &str = "json";

/// File-based implementation of [`CharacterRepository`].
///
/// Stores each character as `{id}.json`. Writes go to a temporary file that
/// is renamed over the target, so readers never observe a partial record.
/// A repository-wide write lock serializes read-modify-write updates.
pub struct FileCharacterRepo {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCharacterRepo {
    /// Create a new file-based character repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to a character file.
    fn character_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.contains("..");
        if !valid {
            return Err(RepositoryError::InvalidId(id.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.{}", id, EXTENSION)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)
    }

    fn read(&self, id: &str) -> Result<Character> {
        let path = self.character_path(id)?;
        if !path.exists() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        let bytes = fs::read(&path)?;
        let character: Character = serde_json::from_slice(&bytes)?;
        tracing::debug!("Loaded character[{}] from {}", id, path.display());
        Ok(character)
    }

    fn write(&self, character: &Character) -> Result<()> {
        let path = self.character_path(&character.id)?;
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(character)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved character[{}] to {}", character.id, path.display());
        Ok(())
    }
}

impl CharacterRepository for FileCharacterRepo {
    fn load(&self, id: &str) -> Result<Character> {
        self.read(id)
    }

    fn save(&self, character: &Character) -> Result<()> {
        let _guard = self.lock()?;
        self.write(character)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(id.to_string());
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock()?;
        let path = self.character_path(id)?;

        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::debug!("Deleted character[{}]", id);
        Ok(true)
    }

    fn update_operation_data(&self, id: &str, edit: OperationDataEdit<'_>) -> Result<Character> {
        let _guard = self.lock()?;
        let mut character = self.read(id)?;
        edit(&mut character.operation_data);
        self.write(&character)?;
        Ok(character)
    }
}

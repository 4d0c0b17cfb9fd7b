//! Client configuration loaded from the environment.

use std::env;
use std::path::PathBuf;

use runtime::RuntimeConfig;

/// Locations the `sheet` binary reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory holding RON content files and `config.toml`.
    pub content_dir: PathBuf,
    /// Directory holding one JSON file per character.
    pub character_dir: PathBuf,
    pub runtime: RuntimeConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            character_dir: PathBuf::from("characters"),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Reads `SHEET_CONTENT_DIR` and `SHEET_CHARACTER_DIR` on top of the
    /// runtime settings.
    pub fn from_env() -> Self {
        let mut config = Self {
            runtime: RuntimeConfig::from_env(),
            ..Self::default()
        };

        if let Some(dir) = read_path("SHEET_CONTENT_DIR") {
            config.content_dir = dir;
        }
        if let Some(dir) = read_path("SHEET_CHARACTER_DIR") {
            config.character_dir = dir;
        }

        config
    }

    /// Command-line overrides win over the environment.
    pub fn with_overrides(
        mut self,
        content_dir: Option<PathBuf>,
        character_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = content_dir {
            self.content_dir = dir;
        }
        if let Some(dir) = character_dir {
            self.character_dir = dir;
        }
        self
    }
}

fn read_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

//! TOML file store

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Directory name used for both global and project config
pub const CONFIG_DIR_NAME: &str = "taskpit";

/// Read-only TOML config store rooted at one directory
#[derive(Debug, Clone)]
pub struct TomlStore {
    base_dir: PathBuf,
}

impl TomlStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Global config (`<config_dir>/taskpit/`)
    pub fn global() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?
            .join(CONFIG_DIR_NAME);
        Ok(Self::new(dir))
    }

    /// Project config (`<root>/.taskpit/`)
    pub fn project(root: impl Into<PathBuf>) -> Self {
        Self::new(root.into().join(format!(".{}", CONFIG_DIR_NAME)))
    }

    /// Project config for the current directory
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    /// Load and parse a file from the store
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        load_file(&self.file_path(filename))
    }

    /// Load a file if it exists
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        if !path.exists() {
            return Ok(None);
        }
        load_file(&path).map(Some)
    }
}

/// Parse one TOML file
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process-wide storage configuration, read once at startup.
///
/// `base_dir` must be an absolute path; the photo files and the pointer
/// database both live underneath it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_extensions: BTreeSet<String>,
    pub allowed_mime_types: BTreeSet<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::new(),
            max_upload_bytes: 5 * 1024 * 1024,
            allowed_extensions: [".jpg", ".jpeg", ".png", ".webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_mime_types: ["image/jpeg", "image/png", "image/webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl StorageConfig {
    /// Loads config from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, StorageConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), StorageConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns the list of validation errors.
    /// Returns an empty vec if the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.base_dir.is_absolute() {
            errors.push("base_dir must be an absolute path".to_string());
        }

        if self.max_upload_bytes == 0 {
            errors.push("max_upload_bytes must be at least 1".to_string());
        }

        if self.allowed_extensions.is_empty() {
            errors.push("allowed_extensions must not be empty".to_string());
        }

        if self.allowed_mime_types.is_empty() {
            errors.push("allowed_mime_types must not be empty".to_string());
        }

        errors
    }

    /// Directory holding the per-owner photo subdirectories.
    pub fn photos_dir(&self) -> PathBuf {
        self.base_dir.join("photos")
    }

    /// Path of the pointer database file.
    pub fn db_path(&self) -> PathBuf {
        self.base_dir.join("profiles.redb")
    }
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, Error)]
pub enum StorageConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

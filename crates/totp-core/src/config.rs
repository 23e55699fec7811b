//! Configuration management for totp-cli
//!
//! Stored as `config.json` in the vault root. Every field has a default, so a
//! missing file and an empty object behave the same.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// File name of the encrypted secrets document
    #[serde(default = "default_secrets_file")]
    pub secrets_file: String,

    /// File name of the raw key material
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Write the document to a temp file and rename it into place
    #[serde(default = "default_atomic_writes")]
    pub atomic_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secrets_file: default_secrets_file(),
            key_file: default_key_file(),
            atomic_writes: default_atomic_writes(),
        }
    }
}

fn default_secrets_file() -> String {
    "secrets.json".to_string()
}

fn default_key_file() -> String {
    "key.bin".to_string()
}

fn default_atomic_writes() -> bool {
    true
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Location of the secrets document
    pub fn secrets_path(&self, paths: &Paths) -> PathBuf {
        paths.file(&self.secrets_file)
    }

    /// Location of the key file
    pub fn key_path(&self, paths: &Paths) -> PathBuf {
        paths.file(&self.key_file)
    }
}

//! Vault - Encrypted TOTP secrets storage
//!
//! All secrets live in one JSON document (`secrets.json`), an array of
//! records in insertion order. Only the `secret` field is encrypted; names and
//! issuers stay readable so listing never needs the key.
//!
//! The document is read from disk on every operation and never cached.
//! Writers in separate processes are not coordinated: the last write wins.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use totp_core::{Config, Paths};
use tracing::{debug, info};

use crate::cipher::SecretCipher;
use crate::error::{Result, VaultError};
use crate::key::KeyManager;
use crate::storage::{ensure_private_dir, write_atomic, write_in_place};

/// Hash algorithm used to derive codes from a stored secret
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "SHA1")]
    Sha1,
}

/// One stored credential, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Unique, case-sensitive name
    pub name: String,

    /// Encrypted secret in `nonce:ciphertext` form
    #[serde(rename = "secret")]
    pub ciphertext: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(default)]
    pub algorithm: Algorithm,
}

/// Listing entry (never carries secret material)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl From<&SecretRecord> for SecretSummary {
    fn from(record: &SecretRecord) -> Self {
        Self {
            name: record.name.clone(),
            issuer: record.issuer.clone(),
        }
    }
}

/// The secrets vault
pub struct SecretVault {
    /// Path to the JSON document
    secrets_path: PathBuf,
    /// Owner of the key file
    keys: KeyManager,
    /// Persist through temp file + rename
    atomic_writes: bool,
}

impl SecretVault {
    /// Create a vault over explicit document and key paths
    pub fn new(secrets_path: &Path, key_path: &Path) -> Self {
        Self {
            secrets_path: secrets_path.to_path_buf(),
            keys: KeyManager::new(key_path),
            atomic_writes: true,
        }
    }

    /// Create a vault at the configured locations
    pub fn open(paths: &Paths, config: &Config) -> Self {
        Self::new(&config.secrets_path(paths), &config.key_path(paths))
            .with_atomic_writes(config.atomic_writes)
    }

    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }

    pub fn key_manager(&self) -> &KeyManager {
        &self.keys
    }

    /// Store a secret, fully replacing any record with the same name
    pub fn store(&self, name: &str, secret: &str, issuer: Option<&str>) -> Result<()> {
        if name.is_empty() {
            return Err(VaultError::InvalidName("name cannot be empty".to_string()));
        }
        self.ensure_storage()?;

        // Load first so a corrupt document aborts before any key is created
        let mut records = self.load()?;

        let key = self.keys.get_or_create_key()?;
        let record = SecretRecord {
            name: name.to_string(),
            ciphertext: SecretCipher::new(key).seal(secret)?,
            issuer: issuer.map(str::to_string),
            algorithm: Algorithm::default(),
        };

        match records.iter_mut().find(|r| r.name == name) {
            Some(existing) => {
                *existing = record;
                debug!(name, "replacing existing secret");
            }
            None => records.push(record),
        }

        self.persist(&records)?;
        info!(name, "stored secret");
        Ok(())
    }

    /// Retrieve and decrypt a secret; `None` if no record has this name
    pub fn fetch(&self, name: &str) -> Result<Option<String>> {
        let Some(record) = self.record(name)? else {
            return Ok(None);
        };

        let key = self.keys.existing_key()?.ok_or_else(|| {
            VaultError::DecryptionFailed(format!(
                "key file {} is missing",
                self.keys.key_path().display()
            ))
        })?;

        let secret = SecretCipher::new(key).open(&record.ciphertext)?;
        debug!(name, "decrypted secret");
        Ok(Some(secret))
    }

    /// Look up a record's metadata without decrypting it
    pub fn record(&self, name: &str) -> Result<Option<SecretRecord>> {
        self.ensure_storage()?;
        Ok(self.load()?.into_iter().find(|r| r.name == name))
    }

    /// Check if a secret exists
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.record(name)?.is_some())
    }

    /// List names and issuers in document order
    pub fn list(&self) -> Result<Vec<SecretSummary>> {
        self.ensure_storage()?;
        Ok(self.load()?.iter().map(SecretSummary::from).collect())
    }

    /// Delete a secret. Returns `false`, without touching the file, when no
    /// record has this name.
    pub fn remove(&self, name: &str) -> Result<bool> {
        self.ensure_storage()?;

        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.name != name);

        if records.len() == before {
            debug!(name, "nothing to remove");
            return Ok(false);
        }

        self.persist(&records)?;
        info!(name, "removed secret");
        Ok(true)
    }

    fn ensure_storage(&self) -> Result<()> {
        match self.secrets_path.parent() {
            Some(dir) => ensure_private_dir(dir),
            None => Ok(()),
        }
    }

    /// Read the full document. A missing or blank file is an empty vault.
    fn load(&self) -> Result<Vec<SecretRecord>> {
        let content = match fs::read_to_string(&self.secrets_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(self.corrupt("document is not valid UTF-8"))
            }
            Err(e) => return Err(VaultError::storage(&self.secrets_path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<SecretRecord> =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        let mut seen = HashSet::new();
        if let Some(dup) = records.iter().find(|r| !seen.insert(r.name.as_str())) {
            return Err(self.corrupt(format!("duplicate secret name '{}'", dup.name)));
        }

        debug!(count = records.len(), "loaded secrets document");
        Ok(records)
    }

    /// Write the full document, replacing whatever was there
    fn persist(&self, records: &[SecretRecord]) -> Result<()> {
        let mut content =
            serde_json::to_vec_pretty(records).map_err(|e| self.corrupt(e.to_string()))?;
        content.push(b'\n');

        if self.atomic_writes {
            write_atomic(&self.secrets_path, &content)
        } else {
            write_in_place(&self.secrets_path, &content)
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> VaultError {
        VaultError::CorruptStore {
            path: self.secrets_path.clone(),
            reason: reason.into(),
        }
    }
}

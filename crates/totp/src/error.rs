//! Vault error taxonomy
//!
//! "Not found" is deliberately absent: `fetch` returns `None` and `remove`
//! returns `false` for names that were never stored.

use std::path::PathBuf;
use thiserror::Error;

/// Vault-specific errors
#[derive(Error, Debug)]
pub enum VaultError {
    /// Directory or file could not be created, read, or written
    #[error("Storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The secrets document is not a well-formed record list
    #[error("Corrupt secrets store at {}: {reason}", path.display())]
    CorruptStore { path: PathBuf, reason: String },

    /// The key file exists but does not hold exactly 32 bytes
    #[error("Corrupt key file at {}: expected 32 bytes, found {len}", path.display())]
    CorruptKeyFile { path: PathBuf, len: usize },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid secret name: {0}")]
    InvalidName(String),
}

impl VaultError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;

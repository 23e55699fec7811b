//! Key Manager - one symmetric key per vault installation
//!
//! The key is 32 random bytes written once to `key.bin` (mode 0600) and never
//! regenerated. Losing or replacing the file strands every stored secret.

use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};
use crate::storage::ensure_private_dir;

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Raw key material, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Generate a fresh key from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Loads the key file on first use and caches it for the life of the process
pub struct KeyManager {
    key_path: PathBuf,
    cached: OnceCell<EncryptionKey>,
}

impl KeyManager {
    pub fn new(key_path: &Path) -> Self {
        Self {
            key_path: key_path.to_path_buf(),
            cached: OnceCell::new(),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Return the cached key, loading or creating the key file on first call
    pub fn get_or_create_key(&self) -> Result<&EncryptionKey> {
        self.cached.get_or_try_init(|| self.load_or_create())
    }

    /// Return the key only if one already exists. Reading never creates a key,
    /// so a missing key file cannot be papered over with a fresh one.
    pub fn existing_key(&self) -> Result<Option<&EncryptionKey>> {
        if let Some(key) = self.cached.get() {
            return Ok(Some(key));
        }

        match self.read_key()? {
            Some(key) => Ok(Some(self.cached.get_or_init(|| key))),
            None => Ok(None),
        }
    }

    fn load_or_create(&self) -> Result<EncryptionKey> {
        if let Some(parent) = self.key_path.parent() {
            ensure_private_dir(parent)?;
        }

        if let Some(key) = self.read_key()? {
            debug!(path = %self.key_path.display(), "loaded encryption key");
            return Ok(key);
        }

        let key = EncryptionKey::generate();
        match self.create_key_file(&key) {
            Ok(()) => {
                info!(path = %self.key_path.display(), "generated new encryption key");
                Ok(key)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                // Another process created the key between our read and create.
                warn!(path = %self.key_path.display(), "key file appeared concurrently, using it");
                self.read_key()?
                    .ok_or_else(|| VaultError::storage(&self.key_path, e))
            }
            Err(e) => Err(VaultError::storage(&self.key_path, e)),
        }
    }

    /// Read and validate the key file; `None` when it does not exist
    fn read_key(&self) -> Result<Option<EncryptionKey>> {
        let mut bytes = match fs::read(&self.key_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::storage(&self.key_path, e)),
        };

        let parsed = <[u8; KEY_SIZE]>::try_from(bytes.as_slice());
        let len = bytes.len();
        bytes.zeroize();

        match parsed {
            Ok(raw) => Ok(Some(EncryptionKey::from_bytes(raw))),
            Err(_) => Err(VaultError::CorruptKeyFile {
                path: self.key_path.clone(),
                len,
            }),
        }
    }

    /// Create the key file exclusively so an existing key is never clobbered
    fn create_key_file(&self, key: &EncryptionKey) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&self.key_path)?;

        let written = file
            .write_all(key.as_bytes())
            .and_then(|_| file.sync_all())
            .and_then(|_| fs::set_permissions(&self.key_path, Permissions::from_mode(0o600)));

        if let Err(e) = written {
            // A short key file would read back as corrupt forever.
            let _ = fs::remove_file(&self.key_path);
            return Err(e);
        }
        Ok(())
    }
}

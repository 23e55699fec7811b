//! Per-record secret encryption
//!
//! AES-256-GCM with a fresh random 96-bit nonce per call. The stored form is
//! `hex(nonce):hex(ciphertext || tag)`. Any failure to recover the plaintext,
//! from a bad separator to a wrong key, is reported as `DecryptionFailed`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, VaultError};
use crate::key::EncryptionKey;

/// Size of the AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

const SEPARATOR: char = ':';

/// Encrypts and decrypts secret values under one key
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypt `plaintext` into its stored `nonce:ciphertext` form
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

        Ok(format!(
            "{}{}{}",
            hex::encode(nonce_bytes),
            SEPARATOR,
            hex::encode(ciphertext)
        ))
    }

    /// Recover the plaintext from its stored form
    pub fn open(&self, encoded: &str) -> Result<String> {
        let (nonce_hex, body_hex) = encoded
            .split_once(SEPARATOR)
            .ok_or_else(|| decryption("missing nonce separator"))?;

        let nonce = hex::decode(nonce_hex).map_err(|e| decryption(format!("bad nonce: {}", e)))?;
        if nonce.len() != NONCE_SIZE {
            return Err(decryption(format!(
                "nonce is {} bytes, expected {}",
                nonce.len(),
                NONCE_SIZE
            )));
        }

        let body =
            hex::decode(body_hex).map_err(|e| decryption(format!("bad ciphertext: {}", e)))?;
        if body.len() < TAG_SIZE {
            return Err(decryption("ciphertext truncated"));
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), body.as_slice())
            .map_err(|_| decryption("wrong key or tampered ciphertext"))?;

        String::from_utf8(plaintext).map_err(|_| decryption("plaintext is not valid UTF-8"))
    }
}

fn decryption(reason: impl Into<String>) -> VaultError {
    VaultError::DecryptionFailed(reason.into())
}

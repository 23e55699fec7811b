//! totp - TOTP codes from an encrypted local vault
//!
//! Named TOTP secrets are kept in a single JSON document. Each secret is
//! sealed with AES-256-GCM under a per-installation key stored next to it
//! (`key.bin`, mode 0600). Codes follow RFC 6238: SHA-1, six digits, 30 s.

pub mod cipher;
pub mod error;
pub mod key;
pub mod otp;
mod storage;
pub mod vault;

pub use error::{Result, VaultError};
pub use key::{EncryptionKey, KeyManager};
pub use otp::{OtpError, OtpGenerator};
pub use vault::{Algorithm, SecretRecord, SecretSummary, SecretVault};

//! totp-core - Shared functionality for totp-cli
//!
//! Where the vault lives and how it is configured.

pub mod config;
pub mod paths;

pub use config::Config;
pub use paths::Paths;

//! Standard paths used by totp-cli

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the whole vault root
pub const HOME_ENV: &str = "TOTP_CLI_HOME";

/// Standard totp-cli paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Root directory (~/.config/totp-cli) holding the vault document and key
    pub root: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let root = resolve_root(env::var_os(HOME_ENV).map(PathBuf::from));
        Self { root }
    }

    /// Paths rooted at an explicit directory
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Get the tool config file path
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Get a file path under the root
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn resolve_root(override_dir: Option<PathBuf>) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("totp-cli"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let root = resolve_root(Some(PathBuf::from("/tmp/totp-home")));
        assert_eq!(root, PathBuf::from("/tmp/totp-home"));
    }

    #[test]
    fn test_empty_override_ignored() {
        let root = resolve_root(Some(PathBuf::new()));
        assert!(root.ends_with("totp-cli"));

        let root = resolve_root(None);
        assert!(root.ends_with("totp-cli"));
    }

    #[test]
    fn test_files_under_root() {
        let paths = Paths::at(Path::new("/srv/vault"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/vault/config.json"));
        assert_eq!(paths.file("key.bin"), PathBuf::from("/srv/vault/key.bin"));
    }
}

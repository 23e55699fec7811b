//! Filesystem helpers shared by the key manager and the vault

use std::fs::{self, File, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, VaultError};

/// Create `dir` (and parents) if absent. A freshly created directory is
/// restricted to the owner; an existing one is left as the user set it up.
pub(crate) fn ensure_private_dir(dir: &Path) -> Result<()> {
    // A bare file name has an empty parent: the working directory.
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| VaultError::storage(dir, e))?;
    fs::set_permissions(dir, Permissions::from_mode(0o700))
        .map_err(|e| VaultError::storage(dir, e))?;
    debug!(dir = %dir.display(), "created storage directory");
    Ok(())
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
///
/// A crash leaves either the old document or the new one, never a mix.
/// Concurrent writers still race; the last rename wins.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = temp_sibling(path);

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(VaultError::storage(&tmp_path, e));
    }

    fs::set_permissions(&tmp_path, Permissions::from_mode(0o600))
        .and_then(|_| fs::rename(&tmp_path, path))
        .map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            VaultError::storage(path, e)
        })
}

/// Overwrite `path` in place
pub(crate) fn write_in_place(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| VaultError::storage(path, e))?;
    fs::set_permissions(path, Permissions::from_mode(0o600))
        .map_err(|e| VaultError::storage(path, e))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

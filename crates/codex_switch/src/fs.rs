//! File primitives shared by every store operation: atomic replacement,
//! private permissions, the store lock and content fingerprints.

use std::{
    fs::{self as std_fs, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::SwitchError;

/// Exclusive advisory lock on the store; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Blocks until the exclusive lock on `path` is held.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, SwitchError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| SwitchError::Lock {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive().map_err(|source| SwitchError::Lock {
            path: path.clone(),
            source,
        })?;
        debug!(lock = %path.display(), "acquired store lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(lock = %self.path.display(), "released store lock");
    }
}

fn ensure_dir(dir: &Path) -> Result<(), SwitchError> {
    std_fs::create_dir_all(dir).map_err(|source| SwitchError::PrepareDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
pub(crate) fn set_private_dir(path: &Path) -> Result<(), SwitchError> {
    set_mode(path, crate::defaults::PRIVATE_DIR_MODE)
}

/// Applies `0600` on Unix; no-op elsewhere.
pub(crate) fn set_private_file(path: &Path) -> Result<(), SwitchError> {
    #[cfg(unix)]
    {
        set_mode(path, crate::defaults::PRIVATE_FILE_MODE)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), SwitchError> {
    use std::os::unix::fs::PermissionsExt;

    std_fs::set_permissions(path, std_fs::Permissions::from_mode(mode)).map_err(|source| {
        SwitchError::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Creates a private temp file next to `destination`.
fn temp_sibling(destination: &Path) -> Result<NamedTempFile, SwitchError> {
    let dir = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(dir)?;

    let temp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)
        .map_err(|source| SwitchError::Write {
            path: destination.to_path_buf(),
            source,
        })?;
    set_private_file(temp.path())?;
    Ok(temp)
}

fn persist(temp: NamedTempFile, destination: &Path) -> Result<(), io::Error> {
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|err| err.error)?;
    Ok(())
}

/// Copies `source` over `destination` byte for byte via a temp file and a
/// rename, so readers never observe a partial file. The result is `0600`.
pub fn atomic_copy(source: &Path, destination: &Path) -> Result<(), SwitchError> {
    let copy_err = |error: io::Error| SwitchError::Copy {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };

    let mut reader = File::open(source).map_err(copy_err)?;
    let mut temp = temp_sibling(destination)?;
    io::copy(&mut reader, temp.as_file_mut()).map_err(copy_err)?;
    persist(temp, destination).map_err(copy_err)?;

    debug!(from = %source.display(), to = %destination.display(), "atomic copy");
    Ok(())
}

/// Replaces `destination` with `contents` atomically. The result is `0600`.
pub fn atomic_write(destination: &Path, contents: &[u8]) -> Result<(), SwitchError> {
    let write_err = |source: io::Error| SwitchError::Write {
        path: destination.to_path_buf(),
        source,
    };

    let mut temp = temp_sibling(destination)?;
    temp.as_file_mut().write_all(contents).map_err(write_err)?;
    persist(temp, destination).map_err(write_err)
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn fingerprint(path: &Path) -> Result<String, SwitchError> {
    let fingerprint_err = |source: io::Error| SwitchError::Fingerprint {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(fingerprint_err)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(fingerprint_err)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Like [`fingerprint`] but maps a missing file to `None`.
pub fn fingerprint_if_exists(path: &Path) -> Result<Option<String>, SwitchError> {
    match fingerprint(path) {
        Ok(value) => Ok(Some(value)),
        Err(SwitchError::Fingerprint { source, .. })
            if source.kind() == io::ErrorKind::NotFound =>
        {
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

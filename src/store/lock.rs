use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

use crate::app::{CourierError, Result};
use crate::store::StateError;

/// Exclusive advisory lock on the state file, released on drop.
///
/// Acquisition never waits: a second run finding the lock held fails with
/// [`CourierError::Locked`] and leaves the state alone.
#[derive(Debug)]
pub struct StateLock {
    path: Option<PathBuf>,
    _file: Option<File>,
}

impl StateLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let io_error = |source| StateError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(io_error)?;

        match file.try_lock() {
            Ok(()) => {
                tracing::debug!("Acquired state lock {}", path.display());
                Ok(Self {
                    path: Some(path.to_path_buf()),
                    _file: Some(file),
                })
            }
            Err(TryLockError::WouldBlock) => Err(CourierError::Locked(path.to_path_buf())),
            Err(TryLockError::Error(e)) => Err(io_error(e).into()),
        }
    }

    /// A guard for stores with no cross-process visibility.
    pub fn unlocked() -> Self {
        Self {
            path: None,
            _file: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

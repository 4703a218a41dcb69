use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app::Result;
use crate::domain::DeliveryState;
use crate::store::{StateError, StateLock, StateStore};

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = "feed_cache.json";

/// [`StateStore`] backed by a single JSON file.
///
/// Saves write a sibling `.tmp` file, fsync it and rename it over the
/// target, so readers only ever see the old or the new document.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, ".tmp")
    }

    /// Reads the file without any fallback: `Ok(None)` when it does not exist,
    /// [`StateError::Corrupt`] when it cannot be parsed.
    pub fn try_load(&self) -> std::result::Result<Option<DeliveryState>, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        serde_json::from_str::<DeliveryState>(&content)
            .map(|state| Some(state.normalized()))
            .map_err(|e| StateError::Corrupt {
                path: self.path.clone(),
                source: e,
            })
    }

    fn io_error(&self, path: &Path, source: io::Error) -> StateError {
        StateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<DeliveryState> {
        match self.try_load() {
            Ok(Some(state)) => {
                tracing::debug!("Loaded state from {}", self.path.display());
                Ok(state)
            }
            Ok(None) => {
                tracing::info!(
                    "No state file at {}, starting with empty state",
                    self.path.display()
                );
                Ok(DeliveryState::default())
            }
            Err(e @ StateError::Corrupt { .. }) => {
                tracing::warn!("{}; treating as empty state", e);
                Ok(DeliveryState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &DeliveryState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let tmp = self.temp_path();
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        write().map_err(|e| self.io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        tracing::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<StateLock> {
        StateLock::acquire(&self.lock_path())
    }
}

/// `feed_cache.json` + `.lock` -> `feed_cache.json.lock`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(DEFAULT_STATE_FILE));
    name.push(suffix);
    path.with_file_name(name)
}

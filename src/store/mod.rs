pub mod json;
pub mod lock;
pub mod memory;

use std::path::PathBuf;

use crate::app::Result;
use crate::domain::DeliveryState;

pub use json::JsonStateStore;
pub use lock::StateLock;
pub use memory::MemoryStateStore;

/// Persistence for [`DeliveryState`].
///
/// Implementations own the state exclusively; the delivery driver is the only
/// caller of [`save`](StateStore::save) during a cycle.
pub trait StateStore: Send + Sync {
    /// Loads the persisted state. Absent or corrupt state yields the empty
    /// state; only unrecoverable I/O failures are returned as errors.
    fn load(&self) -> Result<DeliveryState>;

    /// Replaces the persisted state atomically.
    fn save(&self, state: &DeliveryState) -> Result<()>;

    /// Takes the exclusive cross-process lock held for the length of a cycle.
    fn lock(&self) -> Result<StateLock>;
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("State file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read/write state file at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

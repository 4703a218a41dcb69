use std::sync::Mutex;

use crate::app::Result;
use crate::domain::DeliveryState;
use crate::store::{StateLock, StateStore};

/// In-process [`StateStore`] that records every committed state.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    current: Mutex<DeliveryState>,
    history: Mutex<Vec<DeliveryState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DeliveryState) -> Self {
        Self {
            current: Mutex::new(state),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> DeliveryState {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Every state passed to `save`, oldest first.
    pub fn history(&self) -> Vec<DeliveryState> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<DeliveryState> {
        Ok(self.current())
    }

    fn save(&self, state: &DeliveryState) -> Result<()> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = state.clone();
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(state.clone());
        Ok(())
    }

    fn lock(&self) -> Result<StateLock> {
        Ok(StateLock::unlocked())
    }
}

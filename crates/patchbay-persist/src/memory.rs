// ── In-memory backend ──
//
// Volatile storage for tests and demos: holds the last saved snapshot and
// hands it back on load.

use std::sync::Mutex;

use patchbay_core::persist::{LoadOutcome, PersistError, Persistence, StateSnapshot};

/// Keeps the inventory in memory only. Data is lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<StateSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pre-populated, e.g. to hand an inventory to `load()` in tests.
    pub fn with_state(state: StateSnapshot) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// The most recently saved snapshot, if any.
    pub fn last_saved(&self) -> Option<StateSnapshot> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Result<LoadOutcome, PersistError> {
        let guard = self.state.lock().map_err(|_| PersistError::Io {
            reason: "state lock poisoned".into(),
        })?;
        Ok(match guard.clone() {
            Some(state) => LoadOutcome::new(state.equipment, state.connections),
            None => LoadOutcome::empty(),
        })
    }

    fn save(&self, state: &StateSnapshot) -> Result<(), PersistError> {
        let mut guard = self.state.lock().map_err(|_| PersistError::Io {
            reason: "state lock poisoned".into(),
        })?;
        *guard = Some(state.clone());
        Ok(())
    }
}

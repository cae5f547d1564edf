// ── Persistence boundary ──
//
// The engine consumes this interface and nothing else about storage: an
// adapter loads the two collections and saves them back as a unit. Saves
// happen only after a mutation has fully passed invariant checks, so an
// adapter always observes consistent state.

use thiserror::Error;

use crate::model::{Connection, Equipment};

/// Errors crossing the persistence boundary.
///
/// `Parse` is recoverable by design: the engine substitutes an empty
/// collection for the malformed part and keeps the healthy one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("Malformed {section} data: {reason}")]
    Parse { section: String, reason: String },

    #[error("Storage I/O failed: {reason}")]
    Io { reason: String },
}

/// Consistent point-in-time copy of both collections, saved as a unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub equipment: Vec<Equipment>,
    pub connections: Vec<Connection>,
}

/// Result of a load, with an independent outcome per collection.
///
/// A decode failure in one part must not poison the other — the engine
/// falls back to empty for the failed part only.
#[derive(Debug)]
pub struct LoadOutcome {
    pub equipment: Result<Vec<Equipment>, PersistError>,
    pub connections: Result<Vec<Connection>, PersistError>,
}

impl LoadOutcome {
    /// Both parts present and healthy.
    pub fn new(equipment: Vec<Equipment>, connections: Vec<Connection>) -> Self {
        Self {
            equipment: Ok(equipment),
            connections: Ok(connections),
        }
    }

    /// Nothing stored yet.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Abstract load/save boundary the engine depends on.
///
/// Implementations live outside the core (see `patchbay-persist`); the
/// engine never knows whether bytes go to disk, memory, or elsewhere.
pub trait Persistence: Send + Sync {
    /// Load both collections. A top-level error means the store itself is
    /// unreachable; per-collection decode failures are reported inside the
    /// outcome instead.
    fn load(&self) -> Result<LoadOutcome, PersistError>;

    /// Persist a consistent snapshot of both collections.
    fn save(&self, state: &StateSnapshot) -> Result<(), PersistError>;
}

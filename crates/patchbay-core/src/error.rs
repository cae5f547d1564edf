// ── Core error types ──
//
// Every engine operation reports failure through `CoreError`. None of these
// are fatal: the engine stays usable after any reported error, and a failed
// operation leaves both collections untouched.

use thiserror::Error;

use crate::model::EntityId;
use crate::persist::PersistError;

/// Unified error type for the engine.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Missing references ───────────────────────────────────────────
    #[error("Equipment not found: {id}")]
    EquipmentNotFound { id: EntityId },

    #[error("Connection not found: {id}")]
    ConnectionNotFound { id: EntityId },

    #[error("No port {port} on equipment {device}")]
    PortNotFound { device: EntityId, port: u32 },

    // ── Connection conflicts ─────────────────────────────────────────
    #[error("Connection already exists")]
    DuplicateConnection {
        source_id: EntityId,
        source_port: u32,
        target_id: EntityId,
        target_port: u32,
    },

    #[error("Port {port} on equipment {device} is already connected")]
    PortInUse { device: EntityId, port: u32 },

    // ── Input rejection ──────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Persistence boundary ─────────────────────────────────────────
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

impl CoreError {
    /// True for the NotFound family — the caller should refresh its view.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EquipmentNotFound { .. }
                | Self::ConnectionNotFound { .. }
                | Self::PortNotFound { .. }
        )
    }
}

// patchbay-core: state-consistency engine for the patchbay network inventory.
//
// Owns the canonical equipment/connection collections, enforces referential
// integrity between them, and performs cascading/synchronizing mutations.
// Presentation layers call the operations and render the snapshots; storage
// backends implement the `Persistence` trait (see `patchbay-persist`).

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod persist;
pub mod seed;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::InventoryConfig;
pub use error::CoreError;
pub use notify::{Notice, NoticeKind};
pub use persist::{LoadOutcome, PersistError, Persistence, StateSnapshot};
pub use store::Inventory;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Connection, ConnectionDraft, ConnectionStatus, EntityId, Equipment, EquipmentDraft,
    EquipmentPatch, EquipmentType, MacAddress, Port, PortStatus, VlanConfig,
};

// ── Inventory domain model ──
//
// Canonical representations of every tracked entity. Wire names (serde)
// follow the original inventory data format: camelCase fields, `type` for
// the equipment kind, cross-reference fields omitted when absent.

pub mod connection;
pub mod entity_id;
pub mod equipment;
pub mod port;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use patchbay_core::model::*` gives you everything.

pub use entity_id::{EntityId, MacAddress};

pub use equipment::{Equipment, EquipmentDraft, EquipmentPatch, EquipmentType};

pub use port::{Port, PortStatus, VlanConfig, VLAN_MAX, VLAN_MIN};

pub use connection::{Connection, ConnectionDraft, ConnectionStatus};

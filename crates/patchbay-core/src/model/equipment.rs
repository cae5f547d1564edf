// ── Equipment domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::entity_id::{EntityId, MacAddress};
use super::port::Port;

/// Physical device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EquipmentType {
    Switch,
    Router,
    AccessPoint,
    Server,
    Other,
}

/// A tracked piece of network hardware.
///
/// Constructed only by the engine's add operation — `id` and `added_at` are
/// immutable after creation, `last_updated` is bumped on every mutation that
/// touches the record (including port synchronization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EquipmentType,
    pub model: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<MacAddress>,
    pub ports: Vec<Port>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Equipment {
    /// Look up a port by its 1-based number.
    pub fn port(&self, number: u32) -> Option<&Port> {
        self.ports.iter().find(|p| p.number == number)
    }

    pub fn has_port(&self, number: u32) -> bool {
        self.port(number).is_some()
    }
}

/// Caller-supplied fields for a new equipment record.
///
/// Excludes `id`/`added_at`/`last_updated`, which the engine assigns. When
/// `ports` is absent the engine generates a default sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EquipmentType,
    pub model: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<MacAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<Port>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The full set of mutable equipment fields, applied as a unit.
///
/// Everything a caller may change is named here; `id` and `added_at` cannot
/// be expressed, so they cannot be tampered with. Connection-derived port
/// state is re-established by the engine after the patch lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentPatch {
    pub name: String,
    pub kind: EquipmentType,
    pub model: String,
    pub location: String,
    pub ip_address: Option<IpAddr>,
    pub mac_address: Option<MacAddress>,
    pub ports: Vec<Port>,
    pub notes: Option<String>,
}

impl EquipmentPatch {
    /// Start from the current record, for callers changing a field or two.
    pub fn from_equipment(equipment: &Equipment) -> Self {
        Self {
            name: equipment.name.clone(),
            kind: equipment.kind,
            model: equipment.model.clone(),
            location: equipment.location.clone(),
            ip_address: equipment.ip_address,
            mac_address: equipment.mac_address.clone(),
            ports: equipment.ports.clone(),
            notes: equipment.notes.clone(),
        }
    }
}

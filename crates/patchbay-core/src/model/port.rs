// ── Port and VLAN domain types ──

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CoreError;

use super::entity_id::EntityId;

/// Lowest assignable VLAN id.
pub const VLAN_MIN: u16 = 1;
/// Highest assignable VLAN id (802.1Q range).
pub const VLAN_MAX: u16 = 4094;

/// Operational status of a single port.
///
/// `Connected` is owned by the connection engine: it is set and cleared by
/// the synchronizer, never supplied by callers. `Disabled` and `Error` are
/// administrative states that exist independently of any connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PortStatus {
    Connected,
    Disconnected,
    Disabled,
    Error,
}

/// VLAN membership attached to a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanConfig {
    pub id: u16,
    pub name: String,
    pub tagged: bool,
}

impl VlanConfig {
    /// The untagged default VLAN every freshly generated port carries.
    pub fn default_vlan() -> Self {
        Self {
            id: 1,
            name: "Default".into(),
            tagged: false,
        }
    }
}

/// A numbered connection point on a device.
///
/// `connected_to_id`/`connected_to_port` are present exactly when an active
/// connection links this port to a peer; both are maintained by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: EntityId,
    /// 1-based, unique within the owning device.
    pub number: u32,
    pub status: PortStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to_port: Option<u32>,
    pub vlans: Vec<VlanConfig>,
}

impl Port {
    /// Build the default port sequence for a new device: ports numbered
    /// `1..=count`, each disconnected with the untagged default VLAN.
    pub fn sequence(count: u32) -> Result<Vec<Self>, CoreError> {
        if count == 0 {
            return Err(CoreError::Validation {
                message: "port count must be positive".into(),
            });
        }

        Ok((1..=count)
            .map(|number| Self {
                id: EntityId::generate(),
                number,
                status: PortStatus::Disconnected,
                connected_to_id: None,
                connected_to_port: None,
                vlans: vec![VlanConfig::default_vlan()],
            })
            .collect())
    }
}

/// Structural validation for a caller-supplied port list: numbers unique
/// within the device, VLAN ids in range and unique within each port.
pub(crate) fn validate_ports(ports: &[Port]) -> Result<(), CoreError> {
    let mut numbers = HashSet::new();
    for port in ports {
        if !numbers.insert(port.number) {
            return Err(CoreError::Validation {
                message: format!("duplicate port number {}", port.number),
            });
        }

        let mut vlan_ids = HashSet::new();
        for vlan in &port.vlans {
            if !(VLAN_MIN..=VLAN_MAX).contains(&vlan.id) {
                return Err(CoreError::Validation {
                    message: format!("VLAN id {} out of range on port {}", vlan.id, port.number),
                });
            }
            if !vlan_ids.insert(vlan.id) {
                return Err(CoreError::Validation {
                    message: format!("duplicate VLAN id {} on port {}", vlan.id, port.number),
                });
            }
        }
    }
    Ok(())
}

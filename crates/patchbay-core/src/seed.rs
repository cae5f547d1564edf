// ── Starter dataset ──
//
// A deterministic demo inventory applied through the public operations.
// The engine itself always starts empty; callers that want the familiar
// four-device starter network opt in here.

use crate::error::CoreError;
use crate::model::{
    ConnectionDraft, ConnectionStatus, EquipmentDraft, EquipmentType, MacAddress, Port, VlanConfig,
};
use crate::store::Inventory;

fn management() -> VlanConfig {
    VlanConfig {
        id: 10,
        name: "Management".into(),
        tagged: true,
    }
}

fn voice() -> VlanConfig {
    VlanConfig {
        id: 20,
        name: "Voice".into(),
        tagged: true,
    }
}

fn guest() -> VlanConfig {
    VlanConfig {
        id: 30,
        name: "Guest".into(),
        tagged: true,
    }
}

fn ports_with_vlans(count: u32, vlans: &dyn Fn(u32) -> Vec<VlanConfig>) -> Result<Vec<Port>, CoreError> {
    let mut ports = Port::sequence(count)?;
    for port in &mut ports {
        port.vlans = vlans(port.number);
    }
    Ok(ports)
}

/// Populate an inventory with the starter network: a core switch, an edge
/// router, an access switch, and an office AP, patched together with three
/// active links. Connection-derived port state comes from the engine, so
/// the result is identical on every run.
pub fn starter_inventory(inventory: &Inventory) -> Result<(), CoreError> {
    let all_vlans = |_: u32| vec![VlanConfig::default_vlan(), management(), voice(), guest()];
    let core = inventory.add_equipment(EquipmentDraft {
        name: "Core Switch".into(),
        kind: EquipmentType::Switch,
        model: "Cisco Catalyst 9300".into(),
        location: "Main Server Room".into(),
        ip_address: Some("192.168.1.1".parse().map_err(|_| CoreError::Validation {
            message: "invalid seed address".into(),
        })?),
        mac_address: Some(MacAddress::new("00:1A:2B:3C:4D:5E")),
        ports: Some(ports_with_vlans(24, &all_vlans)?),
        notes: Some("Main core switch handling all inter-VLAN routing".into()),
    })?;

    let default_only = |_: u32| vec![VlanConfig::default_vlan()];
    let edge = inventory.add_equipment(EquipmentDraft {
        name: "Edge Router".into(),
        kind: EquipmentType::Router,
        model: "Cisco ISR 4351".into(),
        location: "Main Server Room".into(),
        ip_address: Some("192.168.1.254".parse().map_err(|_| CoreError::Validation {
            message: "invalid seed address".into(),
        })?),
        mac_address: Some(MacAddress::new("00:2B:3C:4D:5E:6F")),
        ports: Some(ports_with_vlans(8, &default_only)?),
        notes: Some("Edge router connecting to ISP".into()),
    })?;

    let ap_vlans = |_: u32| vec![VlanConfig::default_vlan(), guest()];
    let access_point = inventory.add_equipment(EquipmentDraft {
        name: "Office AP-1".into(),
        kind: EquipmentType::AccessPoint,
        model: "Cisco Meraki MR46".into(),
        location: "East Wing".into(),
        ip_address: Some("192.168.1.10".parse().map_err(|_| CoreError::Validation {
            message: "invalid seed address".into(),
        })?),
        mac_address: Some(MacAddress::new("00:3C:4D:5E:6F:7A")),
        ports: Some(ports_with_vlans(1, &ap_vlans)?),
        notes: Some("Covers the east wing office area".into()),
    })?;

    // First four ports trunk everything; the rest are client-facing.
    let access_vlans = |number: u32| {
        if number <= 4 {
            vec![VlanConfig::default_vlan(), management(), voice(), guest()]
        } else {
            vec![VlanConfig::default_vlan(), voice(), guest()]
        }
    };
    let access = inventory.add_equipment(EquipmentDraft {
        name: "Access Switch 1".into(),
        kind: EquipmentType::Switch,
        model: "Cisco Catalyst 2960".into(),
        location: "First Floor IDF".into(),
        ip_address: Some("192.168.1.2".parse().map_err(|_| CoreError::Validation {
            message: "invalid seed address".into(),
        })?),
        mac_address: Some(MacAddress::new("00:4D:5E:6F:7A:8B")),
        ports: Some(ports_with_vlans(48, &access_vlans)?),
        notes: Some("Serves first floor client devices".into()),
    })?;

    for (source, source_port, target, target_port) in [
        (&core, 1, &edge, 1),
        (&core, 2, &access, 1),
        (&access, 2, &access_point, 1),
    ] {
        inventory.add_connection(ConnectionDraft {
            source_id: source.id.clone(),
            source_port,
            target_id: target.id.clone(),
            target_port,
            status: ConnectionStatus::Active,
        })?;
    }

    Ok(())
}

// ── Inventory engine ──
//
// Owns the canonical equipment and connection collections and every
// mutation against them. All writes flow through the operations here;
// referential integrity (cascade deletes, undirected-duplicate checks,
// port synchronization) is enforced before anything is stored or saved.

mod collection;
pub(crate) mod sync;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::config::InventoryConfig;
use crate::error::CoreError;
use crate::model::port::validate_ports;
use crate::model::{
    Connection, ConnectionDraft, EntityId, Equipment, EquipmentDraft, EquipmentPatch, Port,
};
use crate::notify::Notice;
use crate::persist::{PersistError, Persistence, StateSnapshot};

use collection::EntityCollection;
use sync::PortSync;

const NOTICE_CHANNEL_SIZE: usize = 64;

/// The state-consistency engine: one instance owns both collections.
///
/// Operations run to completion before the next starts; persistence is
/// notified only after a mutation has passed every invariant check. A
/// failed save never rolls back in-memory state.
pub struct Inventory {
    config: InventoryConfig,
    equipment: EntityCollection<Equipment>,
    connections: EntityCollection<Connection>,
    persistence: Option<Arc<dyn Persistence>>,
    notices: broadcast::Sender<Notice>,
}

impl Inventory {
    /// An empty inventory with no persistence attached.
    pub fn new(config: InventoryConfig) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        Self {
            config,
            equipment: EntityCollection::new(),
            connections: EntityCollection::new(),
            persistence: None,
            notices,
        }
    }

    /// An empty inventory wired to a persistence adapter. Call
    /// [`load()`](Self::load) to pull previously saved state.
    pub fn with_persistence(config: InventoryConfig, adapter: Arc<dyn Persistence>) -> Self {
        Self {
            persistence: Some(adapter),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Replace in-memory state with whatever the adapter has stored.
    ///
    /// Each collection falls back to empty independently if its data is
    /// malformed. Connections that no longer resolve to a live (device,
    /// port) endpoint are dropped, and port state is re-derived from the
    /// surviving connections, so loaded state always satisfies the same
    /// invariants as mutated state.
    pub fn load(&self) -> Result<(), CoreError> {
        let Some(adapter) = &self.persistence else {
            return Ok(());
        };

        let outcome = adapter.load()?;
        let equipment = outcome.equipment.unwrap_or_else(|err| {
            warn!(error = %err, "equipment collection unreadable; starting empty");
            Vec::new()
        });
        let connections = outcome.connections.unwrap_or_else(|err| {
            warn!(error = %err, "connection collection unreadable; starting empty");
            Vec::new()
        });

        let resolves = |conn: &Connection| {
            conn.endpoints().into_iter().all(|(device, port)| {
                equipment
                    .iter()
                    .any(|eq| eq.id == *device && eq.has_port(port))
            })
        };
        let (connections, dangling): (Vec<_>, Vec<_>) =
            connections.into_iter().partition(resolves);
        if !dangling.is_empty() {
            warn!(count = dangling.len(), "dropped connections with missing endpoints");
        }

        let connection_arcs: Vec<Arc<Connection>> =
            connections.iter().cloned().map(Arc::new).collect();
        let equipment: Vec<Equipment> = equipment
            .into_iter()
            .map(|eq| sync::reconcile(eq, &connection_arcs))
            .collect();

        self.equipment
            .replace_all(equipment.into_iter().map(|eq| (eq.id.clone(), eq)));
        self.connections
            .replace_all(connections.into_iter().map(|conn| (conn.id.clone(), conn)));

        debug!(
            equipment = self.equipment.len(),
            connections = self.connections.len(),
            "inventory loaded"
        );
        Ok(())
    }

    /// Persist the current state explicitly (useful with autosave off).
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_now().map_err(CoreError::from)
    }

    /// A consistent owned copy of both collections.
    pub fn state_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            equipment: self
                .equipment
                .snapshot()
                .iter()
                .map(|eq| (**eq).clone())
                .collect(),
            connections: self
                .connections
                .snapshot()
                .iter()
                .map(|conn| (**conn).clone())
                .collect(),
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn equipment_snapshot(&self) -> Arc<Vec<Arc<Equipment>>> {
        self.equipment.snapshot()
    }

    pub fn connections_snapshot(&self) -> Arc<Vec<Arc<Connection>>> {
        self.connections.snapshot()
    }

    pub fn equipment_by_id(&self, id: &EntityId) -> Option<Arc<Equipment>> {
        self.equipment.get(id)
    }

    pub fn connection_by_id(&self, id: &EntityId) -> Option<Arc<Connection>> {
        self.connections.get(id)
    }

    pub fn equipment_count(&self) -> usize {
        self.equipment.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_equipment(&self) -> watch::Receiver<Arc<Vec<Arc<Equipment>>>> {
        self.equipment.subscribe()
    }

    pub fn subscribe_connections(&self) -> watch::Receiver<Arc<Vec<Arc<Connection>>>> {
        self.connections.subscribe()
    }

    /// One notice per mutation outcome, success or failure.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    // ── Port factory ─────────────────────────────────────────────────

    /// Default port sequence, bounded by the configured policy ceiling.
    pub fn generate_ports(&self, count: u32) -> Result<Vec<Port>, CoreError> {
        if count > self.config.max_ports_per_device {
            return Err(CoreError::Validation {
                message: format!(
                    "port count {count} exceeds the configured maximum {}",
                    self.config.max_ports_per_device
                ),
            });
        }
        Port::sequence(count)
    }

    // ── Equipment operations ─────────────────────────────────────────

    pub fn add_equipment(&self, draft: EquipmentDraft) -> Result<Equipment, CoreError> {
        self.finish(self.add_equipment_inner(draft), |eq| {
            format!("Added {}", eq.name)
        })
    }

    pub fn update_equipment(
        &self,
        id: &EntityId,
        patch: EquipmentPatch,
    ) -> Result<Equipment, CoreError> {
        self.finish(self.update_equipment_inner(id, patch), |eq| {
            format!("Updated {}", eq.name)
        })
    }

    pub fn delete_equipment(&self, id: &EntityId) -> Result<Equipment, CoreError> {
        self.finish(self.delete_equipment_inner(id), |eq| {
            format!("Deleted {}", eq.name)
        })
    }

    // ── Connection operations ────────────────────────────────────────

    pub fn add_connection(&self, draft: ConnectionDraft) -> Result<Connection, CoreError> {
        self.finish(self.add_connection_inner(draft), |_| {
            "Connection added".into()
        })
    }

    pub fn update_connection(&self, connection: Connection) -> Result<Connection, CoreError> {
        self.finish(self.update_connection_inner(connection), |_| {
            "Connection updated".into()
        })
    }

    pub fn delete_connection(&self, id: &EntityId) -> Result<Connection, CoreError> {
        self.finish(self.delete_connection_inner(id), |_| {
            "Connection removed".into()
        })
    }

    // ── Equipment internals ──────────────────────────────────────────

    fn add_equipment_inner(&self, draft: EquipmentDraft) -> Result<Equipment, CoreError> {
        let ports = match draft.ports {
            Some(ports) => {
                validate_ports(&ports)?;
                ports
            }
            None => self.generate_ports(self.config.default_port_count)?,
        };

        let now = Utc::now();
        let equipment = Equipment {
            id: EntityId::generate(),
            name: draft.name,
            kind: draft.kind,
            model: draft.model,
            location: draft.location,
            ip_address: draft.ip_address,
            mac_address: draft.mac_address,
            ports,
            notes: draft.notes,
            added_at: now,
            last_updated: now,
        };
        // A new device has no connections; strip any connected state the
        // caller smuggled in with the port list.
        let equipment = sync::reconcile(equipment, &[]);

        self.equipment
            .upsert(equipment.id.clone(), equipment.clone());
        self.autosave();
        debug!(id = %equipment.id, name = %equipment.name, "equipment added");
        Ok(equipment)
    }

    fn update_equipment_inner(
        &self,
        id: &EntityId,
        patch: EquipmentPatch,
    ) -> Result<Equipment, CoreError> {
        let current = self
            .equipment
            .get(id)
            .ok_or_else(|| CoreError::EquipmentNotFound { id: id.clone() })?;
        validate_ports(&patch.ports)?;

        let touching: Vec<Arc<Connection>> = self
            .connections
            .snapshot()
            .iter()
            .filter(|conn| conn.touches(id))
            .cloned()
            .collect();

        // A port a live connection references must survive the edit.
        for conn in &touching {
            for (device, port) in conn.endpoints() {
                if device == id && !patch.ports.iter().any(|p| p.number == port) {
                    return Err(CoreError::Validation {
                        message: format!(
                            "port {port} is referenced by a connection and cannot be removed"
                        ),
                    });
                }
            }
        }

        let updated = Equipment {
            id: current.id.clone(),
            name: patch.name,
            kind: patch.kind,
            model: patch.model,
            location: patch.location,
            ip_address: patch.ip_address,
            mac_address: patch.mac_address,
            ports: patch.ports,
            notes: patch.notes,
            added_at: current.added_at,
            last_updated: Utc::now(),
        };
        let updated = sync::reconcile(updated, &touching);

        self.equipment.upsert(updated.id.clone(), updated.clone());
        self.autosave();
        debug!(id = %updated.id, name = %updated.name, "equipment updated");
        Ok(updated)
    }

    fn delete_equipment_inner(&self, id: &EntityId) -> Result<Equipment, CoreError> {
        let target = self
            .equipment
            .get(id)
            .ok_or_else(|| CoreError::EquipmentNotFound { id: id.clone() })?;

        // Cascade before the record disappears: the surviving endpoint of
        // each removed connection still needs its disconnect step.
        let cascade: Vec<Arc<Connection>> = self
            .connections
            .snapshot()
            .iter()
            .filter(|conn| conn.touches(id))
            .cloned()
            .collect();

        let now = Utc::now();
        for conn in &cascade {
            for (device, port) in conn.endpoints() {
                if device != id {
                    self.sync_endpoint(device, &PortSync::Disconnect { port }, now);
                }
            }
            self.connections.remove(&conn.id);
        }

        let removed = self.equipment.remove(id).unwrap_or(target);
        self.autosave();
        debug!(id = %id, cascaded = cascade.len(), "equipment deleted");
        Ok((*removed).clone())
    }

    // ── Connection internals ─────────────────────────────────────────

    fn add_connection_inner(&self, draft: ConnectionDraft) -> Result<Connection, CoreError> {
        if draft.source_id == draft.target_id && draft.source_port == draft.target_port {
            return Err(CoreError::Validation {
                message: "connection endpoints must differ".into(),
            });
        }

        for (device, port) in [
            (&draft.source_id, draft.source_port),
            (&draft.target_id, draft.target_port),
        ] {
            let equipment = self
                .equipment
                .get(device)
                .ok_or_else(|| CoreError::EquipmentNotFound { id: device.clone() })?;
            if !equipment.has_port(port) {
                return Err(CoreError::PortNotFound {
                    device: device.clone(),
                    port,
                });
            }
        }

        let existing = self.connections.snapshot();
        if existing.iter().any(|conn| conn.same_link(&draft)) {
            return Err(CoreError::DuplicateConnection {
                source_id: draft.source_id,
                source_port: draft.source_port,
                target_id: draft.target_id,
                target_port: draft.target_port,
            });
        }
        for (device, port) in [
            (&draft.source_id, draft.source_port),
            (&draft.target_id, draft.target_port),
        ] {
            if existing.iter().any(|conn| conn.links_port(device, port)) {
                return Err(CoreError::PortInUse {
                    device: device.clone(),
                    port,
                });
            }
        }

        let connection = Connection {
            id: EntityId::generate(),
            source_id: draft.source_id,
            source_port: draft.source_port,
            target_id: draft.target_id,
            target_port: draft.target_port,
            status: draft.status,
        };
        self.connections
            .upsert(connection.id.clone(), connection.clone());

        let now = Utc::now();
        self.sync_endpoint(
            &connection.source_id,
            &PortSync::Connect {
                port: connection.source_port,
                peer: connection.target_id.clone(),
                peer_port: connection.target_port,
            },
            now,
        );
        self.sync_endpoint(
            &connection.target_id,
            &PortSync::Connect {
                port: connection.target_port,
                peer: connection.source_id.clone(),
                peer_port: connection.source_port,
            },
            now,
        );

        self.autosave();
        debug!(id = %connection.id, "connection added");
        Ok(connection)
    }

    fn update_connection_inner(&self, connection: Connection) -> Result<Connection, CoreError> {
        let current = self
            .connections
            .get(&connection.id)
            .ok_or_else(|| CoreError::ConnectionNotFound {
                id: connection.id.clone(),
            })?;

        // Endpoints are immutable: moving a link is delete + add, so the
        // synchronizer always runs exactly twice per connection mutation.
        if !current.same_endpoints(&connection) {
            return Err(CoreError::Validation {
                message: "connection endpoints are immutable; delete and re-add to move a link"
                    .into(),
            });
        }

        let updated = Connection {
            status: connection.status,
            ..(*current).clone()
        };
        self.connections.upsert(updated.id.clone(), updated.clone());
        self.autosave();
        debug!(id = %updated.id, status = %updated.status, "connection updated");
        Ok(updated)
    }

    fn delete_connection_inner(&self, id: &EntityId) -> Result<Connection, CoreError> {
        let current = self
            .connections
            .get(id)
            .ok_or_else(|| CoreError::ConnectionNotFound { id: id.clone() })?;

        let now = Utc::now();
        for (device, port) in current.endpoints() {
            self.sync_endpoint(device, &PortSync::Disconnect { port }, now);
        }

        self.connections.remove(id);
        self.autosave();
        debug!(id = %id, "connection removed");
        Ok((*current).clone())
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Run one synchronizer step against a single endpoint and store the
    /// result. A missing device is skipped — cascade order guarantees the
    /// surviving endpoint still exists when this runs.
    fn sync_endpoint(&self, device: &EntityId, sync: &PortSync, at: DateTime<Utc>) {
        if let Some(current) = self.equipment.get(device) {
            let updated = sync::apply(&current, sync, at);
            self.equipment.upsert(device.clone(), updated);
        }
    }

    fn finish<T>(
        &self,
        outcome: Result<T, CoreError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, CoreError> {
        match &outcome {
            Ok(value) => self.notify(Notice::success(success(value))),
            Err(err) => self.notify(Notice::error(err.to_string())),
        }
        outcome
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine; notices are fire-and-forget.
        let _ = self.notices.send(notice);
    }

    fn autosave(&self) {
        if !self.config.autosave {
            return;
        }
        if let Err(err) = self.save_now() {
            warn!(error = %err, "autosave failed; in-memory state retained");
        }
    }

    fn save_now(&self) -> Result<(), PersistError> {
        let Some(adapter) = &self.persistence else {
            return Ok(());
        };
        adapter.save(&self.state_snapshot())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{ConnectionStatus, EquipmentType, PortStatus};
    use crate::notify::NoticeKind;
    use crate::persist::LoadOutcome;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn engine() -> Inventory {
        Inventory::new(InventoryConfig::default())
    }

    fn draft(name: &str, kind: EquipmentType, port_count: u32) -> EquipmentDraft {
        EquipmentDraft {
            name: name.into(),
            kind,
            model: "test-model".into(),
            location: "lab".into(),
            ip_address: None,
            mac_address: None,
            ports: Some(Port::sequence(port_count).unwrap()),
            notes: None,
        }
    }

    fn link(
        source: &Equipment,
        source_port: u32,
        target: &Equipment,
        target_port: u32,
    ) -> ConnectionDraft {
        ConnectionDraft {
            source_id: source.id.clone(),
            source_port,
            target_id: target.id.clone(),
            target_port,
            status: ConnectionStatus::Active,
        }
    }

    // ── Equipment ────────────────────────────────────────────────────

    #[test]
    fn add_assigns_identity_and_timestamps() {
        let inv = engine();
        let added = inv.add_equipment(draft("Core Switch", EquipmentType::Switch, 4)).unwrap();

        assert_eq!(added.added_at, added.last_updated);
        assert!(added.id.as_uuid().is_some());

        let fetched = inv.equipment_by_id(&added.id).unwrap();
        assert_eq!(*fetched, added);
        assert_eq!(fetched.name, "Core Switch");
        assert_eq!(fetched.ports.len(), 4);
    }

    #[test]
    fn add_generates_default_ports_when_absent() {
        let inv = engine();
        let added = inv
            .add_equipment(EquipmentDraft {
                ports: None,
                ..draft("Bare", EquipmentType::Server, 1)
            })
            .unwrap();
        assert_eq!(
            added.ports.len(),
            usize::try_from(inv.config().default_port_count).unwrap()
        );
        assert!(added.ports.iter().all(|p| p.status == PortStatus::Disconnected));
    }

    #[test]
    fn add_strips_forged_connection_state() {
        let inv = engine();
        let mut ports = Port::sequence(2).unwrap();
        ports[0].status = PortStatus::Connected;
        ports[0].connected_to_id = Some(EntityId::from("ghost"));
        ports[0].connected_to_port = Some(3);

        let added = inv
            .add_equipment(EquipmentDraft {
                ports: Some(ports),
                ..draft("Switch", EquipmentType::Switch, 1)
            })
            .unwrap();

        assert_eq!(added.port(1).unwrap().status, PortStatus::Disconnected);
        assert!(added.port(1).unwrap().connected_to_id.is_none());
    }

    #[test]
    fn add_rejects_duplicate_port_numbers() {
        let inv = engine();
        let mut ports = Port::sequence(2).unwrap();
        ports[1].number = 1;
        let err = inv
            .add_equipment(EquipmentDraft {
                ports: Some(ports),
                ..draft("Bad", EquipmentType::Switch, 1)
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(inv.equipment_count(), 0);
    }

    #[test]
    fn generate_ports_respects_policy_ceiling() {
        let inv = engine();
        assert!(inv.generate_ports(96).is_ok());
        assert!(matches!(
            inv.generate_ports(97),
            Err(CoreError::Validation { .. })
        ));
        assert!(inv.generate_ports(0).is_err());
    }

    #[test]
    fn update_preserves_added_at_and_refreshes_last_updated() {
        let inv = engine();
        let added = inv.add_equipment(draft("Old Name", EquipmentType::Switch, 2)).unwrap();

        let mut patch = EquipmentPatch::from_equipment(&added);
        patch.name = "New Name".into();
        patch.location = "Second Floor".into();
        let updated = inv.update_equipment(&added.id, patch).unwrap();

        assert_eq!(updated.id, added.id);
        assert_eq!(updated.added_at, added.added_at);
        assert!(updated.last_updated >= added.last_updated);
        assert_eq!(updated.name, "New Name");
        assert_eq!(inv.equipment_by_id(&added.id).unwrap().name, "New Name");
    }

    #[test]
    fn update_unknown_id_fails() {
        let inv = engine();
        let added = inv.add_equipment(draft("X", EquipmentType::Other, 1)).unwrap();
        let err = inv
            .update_equipment(
                &EntityId::from("missing"),
                EquipmentPatch::from_equipment(&added),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::EquipmentNotFound { .. }));
    }

    #[test]
    fn update_rejects_removing_a_connected_port() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        inv.add_connection(link(&a, 1, &b, 1)).unwrap();

        let mut patch = EquipmentPatch::from_equipment(&inv.equipment_by_id(&a.id).unwrap());
        patch.ports.retain(|p| p.number != 1);
        let err = inv.update_equipment(&a.id, patch).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        // Nothing changed.
        assert_eq!(
            inv.equipment_by_id(&a.id).unwrap().port(1).unwrap().status,
            PortStatus::Connected
        );
    }

    #[test]
    fn update_rederives_connection_state_on_new_ports() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        inv.add_connection(link(&a, 1, &b, 2)).unwrap();

        // Caller hands back a fresh (disconnected) port list.
        let mut patch = EquipmentPatch::from_equipment(&inv.equipment_by_id(&a.id).unwrap());
        patch.ports = Port::sequence(4).unwrap();
        let updated = inv.update_equipment(&a.id, patch).unwrap();

        let port = updated.port(1).unwrap();
        assert_eq!(port.status, PortStatus::Connected);
        assert_eq!(port.connected_to_id, Some(b.id.clone()));
        assert_eq!(port.connected_to_port, Some(2));
    }

    #[test]
    fn delete_unknown_equipment_fails() {
        let inv = engine();
        let err = inv.delete_equipment(&EntityId::from("missing")).unwrap_err();
        assert!(matches!(err, CoreError::EquipmentNotFound { .. }));
    }

    #[test]
    fn delete_cascades_connections_and_disconnects_survivors() {
        let inv = engine();
        let core = inv.add_equipment(draft("Core", EquipmentType::Switch, 2)).unwrap();
        let edge = inv.add_equipment(draft("Edge", EquipmentType::Router, 2)).unwrap();
        inv.add_connection(link(&core, 1, &edge, 1)).unwrap();
        assert_eq!(inv.connection_count(), 1);

        inv.delete_equipment(&core.id).unwrap();

        assert_eq!(inv.connection_count(), 0);
        assert!(inv.equipment_by_id(&core.id).is_none());
        let surviving = inv.equipment_by_id(&edge.id).unwrap();
        let port = surviving.port(1).unwrap();
        assert_eq!(port.status, PortStatus::Disconnected);
        assert!(port.connected_to_id.is_none());
        assert!(port.connected_to_port.is_none());
    }

    #[test]
    fn delete_leaves_unrelated_connections_untouched() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Switch, 2)).unwrap();
        let c = inv.add_equipment(draft("C", EquipmentType::AccessPoint, 2)).unwrap();
        inv.add_connection(link(&a, 1, &b, 1)).unwrap();
        let kept = inv.add_connection(link(&b, 2, &c, 1)).unwrap();

        inv.delete_equipment(&a.id).unwrap();

        let remaining = inv.connections_snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(**remaining.first().unwrap(), kept);
        assert_eq!(
            inv.equipment_by_id(&c.id).unwrap().port(1).unwrap().status,
            PortStatus::Connected
        );
    }

    // ── Connections ──────────────────────────────────────────────────

    #[test]
    fn add_connection_sets_reciprocal_port_state() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();

        inv.add_connection(link(&a, 1, &b, 2)).unwrap();

        let a_port = inv.equipment_by_id(&a.id).unwrap().port(1).unwrap().clone();
        assert_eq!(a_port.status, PortStatus::Connected);
        assert_eq!(a_port.connected_to_id, Some(b.id.clone()));
        assert_eq!(a_port.connected_to_port, Some(2));

        let b_port = inv.equipment_by_id(&b.id).unwrap().port(2).unwrap().clone();
        assert_eq!(b_port.status, PortStatus::Connected);
        assert_eq!(b_port.connected_to_id, Some(a.id.clone()));
        assert_eq!(b_port.connected_to_port, Some(1));
    }

    #[test]
    fn add_connection_bumps_last_updated_on_both_devices() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();

        inv.add_connection(link(&a, 1, &b, 1)).unwrap();

        assert!(inv.equipment_by_id(&a.id).unwrap().last_updated >= a.last_updated);
        assert!(inv.equipment_by_id(&b.id).unwrap().last_updated >= b.last_updated);
    }

    #[test]
    fn reversed_duplicate_is_rejected_without_mutation() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();

        inv.add_connection(link(&a, 1, &b, 2)).unwrap();
        let err = inv.add_connection(link(&b, 2, &a, 1)).unwrap_err();

        assert!(matches!(err, CoreError::DuplicateConnection { .. }));
        assert_eq!(inv.connection_count(), 1);
    }

    #[test]
    fn add_connection_missing_device_or_port_fails() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();

        let err = inv
            .add_connection(ConnectionDraft {
                source_id: a.id.clone(),
                source_port: 1,
                target_id: EntityId::from("missing"),
                target_port: 1,
                status: ConnectionStatus::Active,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::EquipmentNotFound { .. }));

        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        let err = inv.add_connection(link(&a, 9, &b, 1)).unwrap_err();
        assert!(matches!(err, CoreError::PortNotFound { port: 9, .. }));
        assert_eq!(inv.connection_count(), 0);
    }

    #[test]
    fn occupied_port_rejects_second_connection() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        let c = inv.add_equipment(draft("C", EquipmentType::Server, 2)).unwrap();

        inv.add_connection(link(&a, 1, &b, 1)).unwrap();
        let err = inv.add_connection(link(&a, 1, &c, 1)).unwrap_err();

        assert!(matches!(err, CoreError::PortInUse { port: 1, .. }));
        assert_eq!(inv.connection_count(), 1);
        // The untouched endpoint stayed disconnected.
        assert_eq!(
            inv.equipment_by_id(&c.id).unwrap().port(1).unwrap().status,
            PortStatus::Disconnected
        );
    }

    #[test]
    fn same_device_connection_between_distinct_ports() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();

        inv.add_connection(ConnectionDraft {
            source_id: a.id.clone(),
            source_port: 1,
            target_id: a.id.clone(),
            target_port: 2,
            status: ConnectionStatus::Active,
        })
        .unwrap();

        let stored = inv.equipment_by_id(&a.id).unwrap();
        assert_eq!(stored.port(1).unwrap().connected_to_port, Some(2));
        assert_eq!(stored.port(2).unwrap().connected_to_port, Some(1));
    }

    #[test]
    fn self_endpoint_connection_is_rejected() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();

        let err = inv
            .add_connection(ConnectionDraft {
                source_id: a.id.clone(),
                source_port: 1,
                target_id: a.id.clone(),
                target_port: 1,
                status: ConnectionStatus::Active,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn delete_connection_reverts_both_ports() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        let conn = inv.add_connection(link(&a, 1, &b, 2)).unwrap();

        inv.delete_connection(&conn.id).unwrap();

        for (id, port) in [(&a.id, 1), (&b.id, 2)] {
            let stored = inv.equipment_by_id(id).unwrap();
            let port = stored.port(port).unwrap();
            assert_eq!(port.status, PortStatus::Disconnected);
            assert!(port.connected_to_id.is_none());
            assert!(port.connected_to_port.is_none());
        }
        assert_eq!(inv.connection_count(), 0);
    }

    #[test]
    fn delete_unknown_connection_fails() {
        let inv = engine();
        let err = inv.delete_connection(&EntityId::from("missing")).unwrap_err();
        assert!(matches!(err, CoreError::ConnectionNotFound { .. }));
    }

    #[test]
    fn update_connection_changes_status_only() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        let conn = inv.add_connection(link(&a, 1, &b, 1)).unwrap();

        let updated = inv
            .update_connection(Connection {
                status: ConnectionStatus::Warning,
                ..conn.clone()
            })
            .unwrap();
        assert_eq!(updated.status, ConnectionStatus::Warning);
        assert_eq!(
            inv.connection_by_id(&conn.id).unwrap().status,
            ConnectionStatus::Warning
        );
    }

    #[test]
    fn update_connection_rejects_endpoint_changes() {
        let inv = engine();
        let a = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        let b = inv.add_equipment(draft("B", EquipmentType::Router, 2)).unwrap();
        let conn = inv.add_connection(link(&a, 1, &b, 1)).unwrap();

        let err = inv
            .update_connection(Connection {
                source_port: 2,
                ..conn.clone()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(inv.connection_by_id(&conn.id).unwrap().source_port, 1);
    }

    #[test]
    fn update_unknown_connection_fails() {
        let inv = engine();
        let err = inv
            .update_connection(Connection {
                id: EntityId::from("missing"),
                source_id: EntityId::from("a"),
                source_port: 1,
                target_id: EntityId::from("b"),
                target_port: 1,
                status: ConnectionStatus::Active,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::ConnectionNotFound { .. }));
    }

    // ── End-to-end scenario ──────────────────────────────────────────

    #[test]
    fn cascade_scenario_end_to_end() {
        let inv = engine();
        let core = inv.add_equipment(draft("Core", EquipmentType::Switch, 2)).unwrap();
        let edge = inv.add_equipment(draft("Edge", EquipmentType::Router, 2)).unwrap();

        inv.add_connection(link(&core, 1, &edge, 1)).unwrap();
        assert_eq!(inv.connection_count(), 1);

        inv.delete_equipment(&core.id).unwrap();
        assert_eq!(inv.connection_count(), 0);
        assert_eq!(
            inv.equipment_by_id(&edge.id).unwrap().port(1).unwrap().status,
            PortStatus::Disconnected
        );
    }

    // ── Notices ──────────────────────────────────────────────────────

    #[test]
    fn each_mutation_emits_exactly_one_notice() {
        let inv = engine();
        let mut notices = inv.subscribe_notices();

        let a = inv.add_equipment(draft("Core Switch", EquipmentType::Switch, 2)).unwrap();
        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "Added Core Switch");
        assert!(notices.try_recv().is_err());

        let b = inv.add_equipment(draft("Edge", EquipmentType::Router, 2)).unwrap();
        let _ = notices.try_recv().unwrap();

        inv.add_connection(link(&a, 1, &b, 1)).unwrap();
        assert_eq!(notices.try_recv().unwrap().message, "Connection added");

        let err_notice = {
            let _ = inv.add_connection(link(&b, 1, &a, 1)).unwrap_err();
            notices.try_recv().unwrap()
        };
        assert_eq!(err_notice.kind, NoticeKind::Error);
        assert_eq!(err_notice.message, "Connection already exists");
        assert!(notices.try_recv().is_err());
    }

    #[test]
    fn failed_delete_emits_error_notice() {
        let inv = engine();
        let mut notices = inv.subscribe_notices();
        let _ = inv.delete_equipment(&EntityId::from("missing")).unwrap_err();
        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("not found"));
    }

    // ── Persistence wiring ───────────────────────────────────────────

    struct RecordingStore {
        outcome: Mutex<Option<LoadOutcome>>,
        saves: Mutex<Vec<StateSnapshot>>,
        fail_saves: bool,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                outcome: Mutex::new(None),
                saves: Mutex::new(Vec::new()),
                fail_saves: false,
            }
        }

        fn with_outcome(outcome: LoadOutcome) -> Self {
            Self {
                outcome: Mutex::new(Some(outcome)),
                ..Self::new()
            }
        }

        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }
    }

    impl Persistence for RecordingStore {
        fn load(&self) -> Result<LoadOutcome, PersistError> {
            Ok(self
                .outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(LoadOutcome::empty))
        }

        fn save(&self, state: &StateSnapshot) -> Result<(), PersistError> {
            if self.fail_saves {
                return Err(PersistError::Io {
                    reason: "disk full".into(),
                });
            }
            self.saves.lock().unwrap().push(state.clone());
            Ok(())
        }
    }

    #[test]
    fn successful_mutations_autosave_once() {
        let store = Arc::new(RecordingStore::new());
        let inv = Inventory::with_persistence(InventoryConfig::default(), store.clone());

        inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        assert_eq!(store.save_count(), 1);

        let _ = inv.delete_equipment(&EntityId::from("missing"));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn autosave_off_defers_to_explicit_save() {
        let store = Arc::new(RecordingStore::new());
        let config = InventoryConfig {
            autosave: false,
            ..InventoryConfig::default()
        };
        let inv = Inventory::with_persistence(config, store.clone());

        inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        assert_eq!(store.save_count(), 0);

        inv.save().unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.saves.lock().unwrap()[0].equipment.len(), 1);
    }

    #[test]
    fn failed_save_keeps_in_memory_state() {
        let store = Arc::new(RecordingStore {
            fail_saves: true,
            ..RecordingStore::new()
        });
        let inv = Inventory::with_persistence(InventoryConfig::default(), store);

        let added = inv.add_equipment(draft("A", EquipmentType::Switch, 2)).unwrap();
        assert!(inv.equipment_by_id(&added.id).is_some());
        assert!(matches!(
            inv.save().unwrap_err(),
            CoreError::Persistence(PersistError::Io { .. })
        ));
    }

    fn stored_equipment(id: &str, port_count: u32) -> Equipment {
        Equipment {
            id: EntityId::from(id),
            name: format!("device-{id}"),
            kind: EquipmentType::Switch,
            model: "stored".into(),
            location: "closet".into(),
            ip_address: None,
            mac_address: None,
            ports: Port::sequence(port_count).unwrap(),
            notes: None,
            added_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn load_falls_back_per_collection() {
        let conn = Connection {
            id: EntityId::from("c1"),
            source_id: EntityId::from("d1"),
            source_port: 1,
            target_id: EntityId::from("d2"),
            target_port: 1,
            status: ConnectionStatus::Active,
        };
        let store = Arc::new(RecordingStore::with_outcome(LoadOutcome {
            equipment: Err(PersistError::Parse {
                section: "equipment".into(),
                reason: "bad json".into(),
            }),
            connections: Ok(vec![conn]),
        }));
        let inv = Inventory::with_persistence(InventoryConfig::default(), store);

        inv.load().unwrap();
        assert_eq!(inv.equipment_count(), 0);
        // With the equipment gone those endpoints no longer resolve.
        assert_eq!(inv.connection_count(), 0);
    }

    #[test]
    fn load_reconciles_port_state_against_connections() {
        let mut d1 = stored_equipment("d1", 2);
        d1.ports[0].status = PortStatus::Connected;
        d1.ports[0].connected_to_id = Some(EntityId::from("d2"));
        d1.ports[0].connected_to_port = Some(1);
        let d2 = stored_equipment("d2", 2);

        // Connection document was lost; the ports must not keep claiming it.
        let store = Arc::new(RecordingStore::with_outcome(LoadOutcome {
            equipment: Ok(vec![d1, d2]),
            connections: Err(PersistError::Parse {
                section: "connections".into(),
                reason: "truncated".into(),
            }),
        }));
        let inv = Inventory::with_persistence(InventoryConfig::default(), store);

        inv.load().unwrap();
        assert_eq!(inv.equipment_count(), 2);
        assert_eq!(inv.connection_count(), 0);
        let d1 = inv.equipment_by_id(&EntityId::from("d1")).unwrap();
        assert_eq!(d1.port(1).unwrap().status, PortStatus::Disconnected);
        assert!(d1.port(1).unwrap().connected_to_id.is_none());
    }

    #[test]
    fn load_restores_consistent_state() {
        let mut d1 = stored_equipment("d1", 2);
        d1.ports[0].status = PortStatus::Connected;
        d1.ports[0].connected_to_id = Some(EntityId::from("d2"));
        d1.ports[0].connected_to_port = Some(1);
        let mut d2 = stored_equipment("d2", 2);
        d2.ports[0].status = PortStatus::Connected;
        d2.ports[0].connected_to_id = Some(EntityId::from("d1"));
        d2.ports[0].connected_to_port = Some(1);
        let conn = Connection {
            id: EntityId::from("c1"),
            source_id: EntityId::from("d1"),
            source_port: 1,
            target_id: EntityId::from("d2"),
            target_port: 1,
            status: ConnectionStatus::Active,
        };

        let added_at = d1.added_at;
        let store = Arc::new(RecordingStore::with_outcome(LoadOutcome::new(
            vec![d1, d2],
            vec![conn],
        )));
        let inv = Inventory::with_persistence(InventoryConfig::default(), store);

        inv.load().unwrap();
        assert_eq!(inv.equipment_count(), 2);
        assert_eq!(inv.connection_count(), 1);
        let d1 = inv.equipment_by_id(&EntityId::from("d1")).unwrap();
        assert_eq!(d1.port(1).unwrap().status, PortStatus::Connected);
        // Loading must not bump timestamps.
        assert_eq!(d1.added_at, added_at);
    }

    // ── Subscriptions ────────────────────────────────────────────────

    #[test]
    fn equipment_subscribers_observe_mutations() {
        let inv = engine();
        let rx = inv.subscribe_equipment();
        assert!(rx.borrow().is_empty());

        inv.add_equipment(draft("A", EquipmentType::Switch, 1)).unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}

// ── Port synchronizer ──
//
// Pure transforms keeping each port's connection-state fields consistent
// with the connection collection. No side effects: callers pass the
// equipment value and the instant, and get a new value back. The engine
// invokes `apply` once per endpoint per connection mutation.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::model::{Connection, Equipment, EntityId, Port, PortStatus};

/// One endpoint instruction: which port to touch and what to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PortSync {
    /// Mark the port connected to a peer endpoint.
    Connect {
        port: u32,
        peer: EntityId,
        peer_port: u32,
    },
    /// Clear the port back to disconnected.
    Disconnect { port: u32 },
}

/// Return a copy of `equipment` where exactly the instructed port changed.
///
/// Every other port is untouched; `last_updated` is set to `at`. An
/// instruction naming a missing port is a no-op apart from the timestamp —
/// endpoint existence is validated before any synchronization runs.
pub(crate) fn apply(equipment: &Equipment, sync: &PortSync, at: DateTime<Utc>) -> Equipment {
    let ports = equipment
        .ports
        .iter()
        .map(|port| transform_port(port, sync))
        .collect();

    Equipment {
        ports,
        last_updated: at,
        ..equipment.clone()
    }
}

fn transform_port(port: &Port, sync: &PortSync) -> Port {
    match sync {
        PortSync::Connect {
            port: number,
            peer,
            peer_port,
        } if port.number == *number => Port {
            status: PortStatus::Connected,
            connected_to_id: Some(peer.clone()),
            connected_to_port: Some(*peer_port),
            ..port.clone()
        },
        PortSync::Disconnect { port: number } if port.number == *number => Port {
            status: PortStatus::Disconnected,
            connected_to_id: None,
            connected_to_port: None,
            ..port.clone()
        },
        _ => port.clone(),
    }
}

/// Re-derive every port's connection state from the connection collection.
///
/// Used after an equipment update replaces the port list wholesale: any
/// caller-supplied `Connected` status or cross-reference is discarded, then
/// the state implied by live connections is stamped back on. Administrative
/// statuses (`Disabled`, `Error`) pass through untouched.
pub(crate) fn reconcile(equipment: Equipment, connections: &[Arc<Connection>]) -> Equipment {
    let device = equipment.id.clone();
    let ports = equipment
        .ports
        .into_iter()
        .map(|port| {
            let endpoint = connections
                .iter()
                .find(|conn| conn.links_port(&device, port.number))
                .and_then(|conn| {
                    conn.peer_of(&device)
                        .map(|(peer, peer_port)| (peer.clone(), peer_port))
                });

            match endpoint {
                Some((peer, peer_port)) => Port {
                    status: PortStatus::Connected,
                    connected_to_id: Some(peer),
                    connected_to_port: Some(peer_port),
                    ..port
                },
                None => {
                    let status = if port.status == PortStatus::Connected {
                        PortStatus::Disconnected
                    } else {
                        port.status
                    };
                    Port {
                        status,
                        connected_to_id: None,
                        connected_to_port: None,
                        ..port
                    }
                }
            }
        })
        .collect();

    Equipment { ports, ..equipment }
}

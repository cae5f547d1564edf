// ── Connection domain types ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// Health of a point-to-point link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ConnectionStatus {
    Active,
    Inactive,
    Warning,
    Error,
}

/// An undirected link between two (device, port) endpoints.
///
/// Source/target ordering is storage convention only — `(A,p) -> (B,q)` and
/// `(B,q) -> (A,p)` describe the same link and the engine treats them as
/// duplicates of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: EntityId,
    pub source_id: EntityId,
    pub source_port: u32,
    pub target_id: EntityId,
    pub target_port: u32,
    pub status: ConnectionStatus,
}

impl Connection {
    /// Both endpoints as (device, port) pairs, source first.
    pub fn endpoints(&self) -> [(&EntityId, u32); 2] {
        [
            (&self.source_id, self.source_port),
            (&self.target_id, self.target_port),
        ]
    }

    /// Does either endpoint land on the given device?
    pub fn touches(&self, device: &EntityId) -> bool {
        self.source_id == *device || self.target_id == *device
    }

    /// Does either endpoint occupy the given (device, port)?
    pub fn links_port(&self, device: &EntityId, port: u32) -> bool {
        (self.source_id == *device && self.source_port == port)
            || (self.target_id == *device && self.target_port == port)
    }

    /// Undirected endpoint-pair equality.
    pub fn same_link(&self, other: &ConnectionDraft) -> bool {
        let forward = self.source_id == other.source_id
            && self.source_port == other.source_port
            && self.target_id == other.target_id
            && self.target_port == other.target_port;
        let reversed = self.source_id == other.target_id
            && self.source_port == other.target_port
            && self.target_id == other.source_id
            && self.target_port == other.source_port;
        forward || reversed
    }

    /// Same endpoints in the same stored orientation.
    pub(crate) fn same_endpoints(&self, other: &Connection) -> bool {
        self.source_id == other.source_id
            && self.source_port == other.source_port
            && self.target_id == other.target_id
            && self.target_port == other.target_port
    }

    /// The endpoint opposite the given device, if the device is an endpoint.
    /// For a device linked to itself the source endpoint wins.
    pub fn peer_of(&self, device: &EntityId) -> Option<(&EntityId, u32)> {
        if self.source_id == *device {
            Some((&self.target_id, self.target_port))
        } else if self.target_id == *device {
            Some((&self.source_id, self.source_port))
        } else {
            None
        }
    }
}

/// Caller-supplied fields for a new connection; the engine assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDraft {
    pub source_id: EntityId,
    pub source_port: u32,
    pub target_id: EntityId,
    pub target_port: u32,
    pub status: ConnectionStatus,
}
